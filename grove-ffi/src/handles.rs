use std::ffi::c_void;

/// Engine object identity: the stable instance id plus the engine-side pointer.
/// The host never dereferences `ptr`; `id` is the identity key.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObjectHandle {
    pub id: u64,
    pub ptr: *mut c_void,
}

impl ObjectHandle {
    pub const NULL: ObjectHandle = ObjectHandle {
        id: 0,
        ptr: std::ptr::null_mut(),
    };

    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }
}

impl Default for ObjectHandle {
    fn default() -> Self {
        Self::NULL
    }
}

/// Opaque handle to an engine method bind (or utility function) resolved by
/// `(class, method, hash)`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MethodBindPtr(pub *const c_void);

impl MethodBindPtr {
    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

/// Borrowed UTF-8 string. Not null-terminated; valid only for the duration
/// of the call it is passed to.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RawStr {
    pub ptr: *const u8,
    pub len: u64,
}

impl RawStr {
    pub const EMPTY: RawStr = RawStr {
        ptr: std::ptr::null(),
        len: 0,
    };

    pub fn from_str(s: &str) -> Self {
        RawStr {
            ptr: s.as_ptr(),
            len: s.len() as u64,
        }
    }

    /// The bytes as passed, not yet checked for UTF-8.
    ///
    /// # Safety
    /// `ptr` must point at `len` readable bytes for the returned lifetime.
    pub unsafe fn as_bytes<'a>(&self) -> &'a [u8] {
        if self.ptr.is_null() || self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr, self.len as usize) }
    }
}

// Handles are raw FFI identifiers. They can be sent across threads
// (but must only be *used* on the engine's main thread).
unsafe impl Send for ObjectHandle {}
unsafe impl Sync for ObjectHandle {}
unsafe impl Send for MethodBindPtr {}
unsafe impl Sync for MethodBindPtr {}
unsafe impl Send for RawStr {}
unsafe impl Sync for RawStr {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handle_is_null() {
        assert!(ObjectHandle::NULL.is_null());
        assert!(ObjectHandle::default().is_null());
    }

    #[test]
    fn raw_str_round_trips() {
        let text = String::from("position");
        let raw = RawStr::from_str(&text);
        assert_eq!(unsafe { raw.as_bytes() }, b"position");
        assert!(unsafe { RawStr::EMPTY.as_bytes() }.is_empty());
    }
}
