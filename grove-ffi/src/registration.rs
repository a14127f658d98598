// Descriptors the host passes to the engine when registering extension classes.

use crate::handles::RawStr;

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RawClassInfo {
    pub name: RawStr,
    pub parent: RawStr,
    pub is_abstract: bool,
    pub is_exposed: bool,
}

/// Property or argument metadata. `class_name` is only meaningful for
/// `VARIANT_OBJECT` and enum-typed (`PROPERTY_USAGE_CLASS_IS_ENUM`) members.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RawPropertyInfo {
    pub name: RawStr,
    pub class_name: RawStr,
    pub variant_type: u32,
    pub hint: u32,
    pub hint_string: RawStr,
    pub usage: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RawMethodInfo {
    pub name: RawStr,
    pub flags: u32,
    pub has_return: bool,
    pub return_info: RawPropertyInfo,
    pub args: *const RawPropertyInfo,
    pub argc: u32,
}
