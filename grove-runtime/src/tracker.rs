// Object lifetime tracker.
//
// Identity map from instance id to the one live `ObjectCell`, plus the
// extension instance slots. Rules:
//   * a ref-counted object has exactly one engine reference held on behalf
//     of all host wrappers, taken on first sighting and dropped with the
//     last wrapper;
//   * when that drop brings the engine count to zero the host destroys the
//     object, exactly once;
//   * manual objects are never freed by the tracker;
//   * engine calls happen outside the map locks.

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use grove_ffi::ObjectHandle;

use crate::context::EngineContext;
use crate::engine::Engine;
use crate::error::{GroveError, GroveResult};
use crate::lock_or_recover;
use crate::object::{ObjectCell, ObjectRef, Transfer};

type InstanceData = Option<Box<dyn Any + Send + Sync>>;

/// Host-side data of one extension instance.
pub struct InstanceStorage {
    class: String,
    data: RwLock<InstanceData>,
}

impl InstanceStorage {
    pub fn class_name(&self) -> &str {
        &self.class
    }

    pub fn read<T: 'static>(&self, id: u64) -> GroveResult<InstanceRef<'_, T>> {
        let guard = self.data.try_read().map_err(|_| GroveError::AlreadyBound { id })?;
        let ptr = guard
            .as_ref()
            .and_then(|data| data.downcast_ref::<T>())
            .map(|value| value as *const T)
            .ok_or_else(|| self.wrong_type::<T>())?;
        Ok(InstanceRef {
            _guard: guard,
            ptr,
            _marker: PhantomData,
        })
    }

    pub fn write<T: 'static>(&self, id: u64) -> GroveResult<InstanceMut<'_, T>> {
        let mut guard = self.data.try_write().map_err(|_| GroveError::AlreadyBound { id })?;
        let ptr = guard
            .as_mut()
            .and_then(|data| data.downcast_mut::<T>())
            .map(|value| value as *mut T)
            .ok_or_else(|| self.wrong_type::<T>())?;
        Ok(InstanceMut {
            _guard: guard,
            ptr,
            _marker: PhantomData,
        })
    }

    /// Untyped exclusive access, used by the dispatch tables.
    pub fn with_mut<R>(
        &self,
        id: u64,
        f: impl FnOnce(&mut (dyn Any + Send + Sync)) -> GroveResult<R>,
    ) -> GroveResult<R> {
        let mut guard = self.data.try_write().map_err(|_| GroveError::AlreadyBound { id })?;
        match guard.as_mut() {
            Some(data) => f(data.as_mut()),
            None => Err(GroveError::StaleReference { id }),
        }
    }

    /// Untyped shared access.
    pub fn with_ref<R>(&self, id: u64, f: impl FnOnce(&(dyn Any + Send + Sync)) -> R) -> GroveResult<R> {
        let guard = self.data.try_read().map_err(|_| GroveError::AlreadyBound { id })?;
        match guard.as_ref() {
            Some(data) => Ok(f(data.as_ref())),
            None => Err(GroveError::StaleReference { id }),
        }
    }

    fn wrong_type<T>(&self) -> GroveError {
        GroveError::InvalidCast {
            from: self.class.clone(),
            to: std::any::type_name::<T>().to_string(),
        }
    }

    fn take(&self) -> InstanceData {
        match self.data.write() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

/// Shared borrow of an extension instance.
pub struct InstanceRef<'a, T> {
    _guard: RwLockReadGuard<'a, InstanceData>,
    ptr: *const T,
    _marker: PhantomData<&'a T>,
}

impl<T> Deref for InstanceRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // The pointer was derived from the data the guard keeps locked.
        unsafe { &*self.ptr }
    }
}

/// Exclusive borrow of an extension instance.
pub struct InstanceMut<'a, T> {
    _guard: RwLockWriteGuard<'a, InstanceData>,
    ptr: *mut T,
    _marker: PhantomData<&'a mut T>,
}

impl<T> Deref for InstanceMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.ptr }
    }
}

impl<T> DerefMut for InstanceMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.ptr }
    }
}

#[derive(Default)]
pub struct ObjectTracker {
    live: Mutex<HashMap<u64, Weak<ObjectCell>>>,
    instances: Mutex<HashMap<u64, Arc<InstanceStorage>>>,
}

impl ObjectTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical reference for `handle`.
    ///
    /// The first sighting resolves the most-derived class and, for
    /// ref-counted classes, takes (`Borrowed`) or adopts (`Owned`) the one
    /// engine reference the cell holds. Later sightings return the same
    /// cell; a surplus `Owned` reference is handed back to the engine.
    pub fn attach(
        &self,
        ctx: &Arc<EngineContext>,
        handle: ObjectHandle,
        transfer: Transfer,
    ) -> GroveResult<ObjectRef> {
        if handle.is_null() {
            return Err(GroveError::NullObject);
        }
        let engine = ctx.engine();
        if let Some(cell) = self.lookup(handle.id) {
            if transfer == Transfer::Owned && cell.holds_reference {
                engine.unreference(handle);
            }
            return Ok(ObjectRef(cell));
        }

        let class = engine.object_class(handle)?;
        let refcounted = ctx.registry().is_a(engine, &class, crate::registry::REFCOUNTED_CLASS);
        if refcounted && transfer == Transfer::Borrowed {
            engine.reference(handle);
        }
        let fresh = Arc::new(ObjectCell {
            handle,
            class,
            refcounted,
            holds_reference: refcounted,
            host_owned: AtomicBool::new(false),
            alive: AtomicBool::new(true),
            instance: OnceLock::new(),
            ctx: Arc::downgrade(ctx),
        });
        if let Some(storage) = lock_or_recover(&self.instances).get(&handle.id) {
            let _ = fresh.instance.set(Arc::clone(storage));
        }

        let winner = {
            let mut live = lock_or_recover(&self.live);
            match live.get(&handle.id).and_then(Weak::upgrade) {
                Some(existing) => Some(existing),
                None => {
                    live.insert(handle.id, Arc::downgrade(&fresh));
                    None
                }
            }
        };
        // Another thread won the race: dropping `fresh` outside the lock
        // returns whatever reference it took.
        match winner {
            Some(existing) => Ok(ObjectRef(existing)),
            None => {
                log::trace!("attached {} #{}", fresh.class, handle.id);
                Ok(ObjectRef(fresh))
            }
        }
    }

    fn lookup(&self, id: u64) -> Option<Arc<ObjectCell>> {
        lock_or_recover(&self.live).get(&id).and_then(Weak::upgrade)
    }

    /// Live cell for `id` without touching the engine.
    pub fn get(&self, id: u64) -> Option<ObjectRef> {
        self.lookup(id).map(ObjectRef)
    }

    /// Number of identities with at least one host wrapper.
    pub fn live_count(&self) -> usize {
        lock_or_recover(&self.live)
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Called when the last wrapper of `cell` goes away.
    pub(crate) fn release(&self, engine: &dyn Engine, cell: &ObjectCell) {
        let id = cell.handle.id;
        {
            let mut live = lock_or_recover(&self.live);
            if live.get(&id).is_some_and(|w| std::ptr::eq(w.as_ptr(), cell)) {
                live.remove(&id);
            }
        }
        if !cell.holds_reference || !cell.alive.load(Ordering::Acquire) {
            return;
        }
        if engine.unreference(cell.handle) {
            cell.alive.store(false, Ordering::Release);
            log::trace!("last reference to {} #{} dropped, destroying", cell.class, id);
            drop(self.unbind_instance(id));
            engine.destroy(cell.handle);
        }
    }

    /// Host-initiated free of a manual object.
    pub(crate) fn free(&self, engine: &dyn Engine, obj: &ObjectRef) {
        let id = obj.instance_id();
        if obj.0.alive.swap(false, Ordering::AcqRel) {
            lock_or_recover(&self.live).remove(&id);
            drop(self.unbind_instance(id));
            engine.destroy(obj.handle());
        }
    }

    /// The engine freed `id`. Every wrapper turns stale.
    pub fn invalidate(&self, id: u64) {
        let cell = lock_or_recover(&self.live).remove(&id).and_then(|w| w.upgrade());
        if let Some(cell) = &cell {
            cell.alive.store(false, Ordering::Release);
        }
        drop(self.unbind_instance(id));
        // `cell` drops here, outside every lock.
    }

    // -----------------------------------------------------------------------
    // Extension instances
    // -----------------------------------------------------------------------

    /// Attach host data to the engine object `id`.
    pub fn bind_instance(
        &self,
        id: u64,
        class: &str,
        data: Box<dyn Any + Send + Sync>,
    ) -> GroveResult<Arc<InstanceStorage>> {
        let storage = Arc::new(InstanceStorage {
            class: class.to_string(),
            data: RwLock::new(Some(data)),
        });
        {
            let mut instances = lock_or_recover(&self.instances);
            if instances.contains_key(&id) {
                return Err(GroveError::AlreadyBound { id });
            }
            instances.insert(id, Arc::clone(&storage));
        }
        if let Some(cell) = self.lookup(id) {
            let _ = cell.instance.set(Arc::clone(&storage));
        }
        Ok(storage)
    }

    /// Detach and return the host data of `id`, if any.
    pub fn unbind_instance(&self, id: u64) -> Option<Box<dyn Any + Send + Sync>> {
        let storage = lock_or_recover(&self.instances).remove(&id)?;
        storage.take()
    }

    pub fn instance(&self, id: u64) -> Option<Arc<InstanceStorage>> {
        lock_or_recover(&self.instances).get(&id).cloned()
    }

    pub fn instance_count(&self) -> usize {
        lock_or_recover(&self.instances).len()
    }

    /// Drop every instance and stale every wrapper. Used at shutdown.
    pub fn clear(&self) {
        let cells: Vec<Arc<ObjectCell>> = lock_or_recover(&self.live)
            .drain()
            .filter_map(|(_, w)| w.upgrade())
            .collect();
        for cell in &cells {
            cell.alive.store(false, Ordering::Release);
        }
        let instances: Vec<Arc<InstanceStorage>> =
            lock_or_recover(&self.instances).drain().map(|(_, s)| s).collect();
        let data: Vec<InstanceData> = instances.iter().map(|s| s.take()).collect();
        drop(data);
        drop(cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Player {
        hp: i32,
    }

    fn storage() -> InstanceStorage {
        InstanceStorage {
            class: "Player".into(),
            data: RwLock::new(Some(Box::new(Player { hp: 10 }))),
        }
    }

    #[test]
    fn shared_binds_coexist() {
        let s = storage();
        let a = s.read::<Player>(1).unwrap();
        let b = s.read::<Player>(1).unwrap();
        assert_eq!(a.hp + b.hp, 20);
    }

    #[test]
    fn exclusive_bind_rejects_reentry() {
        let s = storage();
        let mut w = s.write::<Player>(1).unwrap();
        w.hp = 3;
        assert!(matches!(s.read::<Player>(1), Err(GroveError::AlreadyBound { id: 1 })));
        assert!(matches!(s.write::<Player>(1), Err(GroveError::AlreadyBound { id: 1 })));
        drop(w);
        assert_eq!(s.read::<Player>(1).unwrap().hp, 3);
    }

    #[test]
    fn wrong_type_is_an_invalid_cast() {
        let s = storage();
        assert!(matches!(s.read::<String>(1), Err(GroveError::InvalidCast { .. })));
    }

    #[test]
    fn taken_data_is_stale() {
        let s = storage();
        assert!(s.take().is_some());
        assert!(matches!(s.with_mut(7, |_| Ok(())), Err(GroveError::StaleReference { id: 7 })));
    }

    #[test]
    fn instances_bind_once() {
        let tracker = ObjectTracker::new();
        tracker.bind_instance(5, "Player", Box::new(Player { hp: 1 })).unwrap();
        assert!(matches!(
            tracker.bind_instance(5, "Player", Box::new(Player { hp: 2 })),
            Err(GroveError::AlreadyBound { id: 5 })
        ));
        let data = tracker.unbind_instance(5).unwrap();
        assert_eq!(data.downcast_ref::<Player>(), Some(&Player { hp: 1 }));
        assert!(tracker.unbind_instance(5).is_none());
    }
}
