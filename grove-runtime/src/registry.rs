// Class registry.
//
// One table keyed by class name holds the engine classes (from the generated
// `ENGINE_CLASSES`) and the extension classes registered at load. Parents of
// classes outside the table are asked from the engine once and cached.
//
// Extension classes come from `inventory`:
//   * `#[gclass]` submits a `ClassRegistration`,
//   * each `#[gclass_impl]` block submits a `ClassMethodsRegistration`.
// `register_extensions` orders them bases first, builds exports and dispatch
// tables, then announces each class to the engine.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use grove_ffi::ObjectHandle;

use crate::context::EngineContext;
use crate::dispatch::{DispatchTable, FuncInfo, FuncKind, VirtualSlot};
use crate::engine::{ClassInfo, Engine, MethodMeta};
use crate::error::{GroveError, GroveResult};
use crate::export::{ExportEntry, ExportList};
use crate::lock_or_recover;
use crate::object::Base;
use crate::traits::GodotClass;
use crate::variant::Variant;

pub const ROOT_CLASS: &str = "Object";
pub const REFCOUNTED_CLASS: &str = "RefCounted";

/// Guard against corrupt parent data.
const MAX_DEPTH: usize = 64;

/// Static facts about one engine class, emitted by codegen.
#[derive(Clone, Copy, Debug)]
pub struct EngineClassMeta {
    pub name: &'static str,
    pub parent: Option<&'static str>,
    pub refcounted: bool,
    pub instantiable: bool,
    pub virtuals: &'static [VirtualSlot],
}

/// Handed to an extension class constructor.
pub struct InstanceInit<'a> {
    pub(crate) handle: ObjectHandle,
    pub(crate) ctx: &'a Arc<EngineContext>,
}

impl InstanceInit<'_> {
    pub fn instance_id(&self) -> u64 {
        self.handle.id
    }

    /// Non-owning link to the engine object being initialised.
    pub fn base<T: GodotClass>(&self) -> Base<T> {
        Base::new(self.handle, Arc::downgrade(self.ctx))
    }

    pub fn context(&self) -> &Arc<EngineContext> {
        self.ctx
    }
}

pub type CreateFn = fn(&InstanceInit<'_>) -> Box<dyn Any + Send + Sync>;
pub type GetPropertyFn = fn(&(dyn Any + Send + Sync), &str) -> Option<Variant>;
/// `Ok(false)` for unknown members.
pub type SetPropertyFn = fn(&mut (dyn Any + Send + Sync), &str, &Variant) -> GroveResult<bool>;

/// Everything `#[gclass]` generates for one extension class.
#[derive(Clone, Copy)]
pub struct ExtensionClassInfo {
    pub name: &'static str,
    pub base: &'static str,
    pub create: CreateFn,
    pub exports: fn() -> GroveResult<ExportList>,
    pub get_property: GetPropertyFn,
    pub set_property: SetPropertyFn,
}

pub struct ClassRegistration {
    pub info: fn() -> ExtensionClassInfo,
}
inventory::collect!(ClassRegistration);

pub struct ClassMethodsRegistration {
    pub class: &'static str,
    pub methods: fn() -> Vec<FuncInfo>,
}
inventory::collect!(ClassMethodsRegistration);

/// A registered extension class.
pub struct ExtensionClass {
    pub info: ExtensionClassInfo,
    pub exports: ExportList,
    pub dispatch: DispatchTable,
}

impl ExtensionClass {
    pub fn name(&self) -> &'static str {
        self.info.name
    }
}

enum ClassKind {
    Engine(EngineClassMeta),
    Extension(Arc<ExtensionClass>),
}

struct ClassEntry {
    parent: Option<String>,
    kind: ClassKind,
}

#[derive(Default)]
pub struct ClassRegistry {
    classes: RwLock<HashMap<String, ClassEntry>>,
    /// Parents learned from the engine for classes outside the table.
    learned: RwLock<HashMap<String, Option<String>>>,
    /// Extension classes in registration order.
    extensions: Mutex<Vec<String>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ClassEntry>> {
        self.classes.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ClassEntry>> {
        self.classes.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register_engine_classes(&self, metas: &[EngineClassMeta]) {
        let mut classes = self.write();
        for meta in metas {
            classes.insert(
                meta.name.to_string(),
                ClassEntry {
                    parent: meta.parent.map(str::to_string),
                    kind: ClassKind::Engine(*meta),
                },
            );
        }
        log::debug!("{} engine classes in the registry", metas.len());
    }

    pub fn contains(&self, class: &str) -> bool {
        self.read().contains_key(class)
    }

    pub fn engine_class(&self, class: &str) -> Option<EngineClassMeta> {
        match &self.read().get(class)?.kind {
            ClassKind::Engine(meta) => Some(*meta),
            ClassKind::Extension(_) => None,
        }
    }

    pub fn extension(&self, class: &str) -> Option<Arc<ExtensionClass>> {
        match &self.read().get(class)?.kind {
            ClassKind::Extension(ext) => Some(Arc::clone(ext)),
            ClassKind::Engine(_) => None,
        }
    }

    /// Parent of `class`: from the table, then from the engine (cached).
    /// `None` for the root and for classes nobody knows.
    pub fn parent_of(&self, engine: &dyn Engine, class: &str) -> Option<String> {
        if let Some(entry) = self.read().get(class) {
            return entry.parent.clone();
        }
        if let Some(parent) = self.learned.read().unwrap_or_else(|e| e.into_inner()).get(class) {
            return parent.clone();
        }
        let parent = match engine.class_parent(class) {
            Ok(parent) => parent,
            Err(e) => {
                log::warn!("parent of `{class}` unavailable: {e}");
                return None;
            }
        };
        self.learned
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(class.to_string(), parent.clone());
        parent
    }

    /// `true` if `class` is `base` or derives from it.
    pub fn is_a(&self, engine: &dyn Engine, class: &str, base: &str) -> bool {
        let mut current = class.to_string();
        for _ in 0..MAX_DEPTH {
            if current == base {
                return true;
            }
            match self.parent_of(engine, &current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        log::error!("class chain of `{class}` exceeds {MAX_DEPTH} levels");
        false
    }

    /// Nearest virtual slot named `method` in the engine classes `class`
    /// derives from.
    pub fn virtual_slot(&self, engine: &dyn Engine, class: &str, method: &str) -> Option<VirtualSlot> {
        let mut current = Some(class.to_string());
        for _ in 0..MAX_DEPTH {
            let name = current?;
            let slot = self
                .engine_class(&name)
                .and_then(|meta| meta.virtuals.iter().find(|s| s.name == method).copied());
            if slot.is_some() {
                return slot;
            }
            current = self.parent_of(engine, &name);
        }
        None
    }

    /// Register extension classes, bases before subclasses. Returns how many
    /// were registered.
    pub fn register_extensions(
        &self,
        engine: &dyn Engine,
        classes: Vec<ExtensionClassInfo>,
        mut methods: HashMap<&'static str, Vec<FuncInfo>>,
    ) -> GroveResult<usize> {
        let mut pending = classes;
        let mut count = 0;
        while !pending.is_empty() {
            let ready = pending
                .iter()
                .position(|c| !pending.iter().any(|p| p.name == c.base))
                .ok_or_else(|| {
                    let names: Vec<&str> = pending.iter().map(|c| c.name).collect();
                    GroveError::Registration(format!("inheritance cycle among {}", names.join(", ")))
                })?;
            let info = pending.remove(ready);
            let funcs = methods.remove(info.name).unwrap_or_default();
            self.register_extension(engine, info, funcs)?;
            count += 1;
        }
        for class in methods.keys() {
            log::warn!("#[gclass_impl] for `{class}` has no matching #[gclass]");
        }
        Ok(count)
    }

    fn register_extension(
        &self,
        engine: &dyn Engine,
        info: ExtensionClassInfo,
        funcs: Vec<FuncInfo>,
    ) -> GroveResult<()> {
        let name = info.name;
        if self.contains(name) {
            return Err(GroveError::Registration(format!("`{name}` is already registered")));
        }
        let base_known = self.contains(info.base) || engine.class_parent(info.base).is_ok();
        if !base_known {
            return Err(GroveError::Registration(format!(
                "`{name}` extends unknown class `{}`",
                info.base
            )));
        }

        let exports = (info.exports)()?;
        let inherited = self.extension(info.base);
        let methods: Vec<MethodMeta> = funcs
            .iter()
            .filter(|f| f.kind == FuncKind::Func)
            .map(|f| MethodMeta {
                name: f.name.to_string(),
                flags: f.flags,
                args: f.args.clone(),
                ret: f.ret.clone(),
            })
            .collect();
        let dispatch = DispatchTable::build(funcs, inherited.as_ref().map(|e| &e.dispatch));

        engine.register_class(&ClassInfo {
            name: name.to_string(),
            parent: info.base.to_string(),
            is_abstract: false,
            is_exposed: true,
        })?;
        let announced = (|| {
            for method in &methods {
                engine.register_method(name, method)?;
            }
            for entry in exports.entries() {
                match entry {
                    ExportEntry::Group { name: group, prefix } => {
                        engine.register_group(name, group, prefix, false)?
                    }
                    ExportEntry::Subgroup { name: group, prefix } => {
                        engine.register_group(name, group, prefix, true)?
                    }
                    ExportEntry::Member(member) => engine.register_property(name, &member.info)?,
                }
            }
            Ok(())
        })();
        // The engine must not keep a half-announced class.
        if let Err(e) = announced {
            if let Err(undo) = engine.unregister_class(name) {
                log::warn!("rolling back `{name}` failed: {undo}");
            }
            return Err(e);
        }

        log::info!(
            "registered {name} : {} ({} methods, {} exports)",
            info.base,
            dispatch.len(),
            exports.members().count()
        );
        self.write().insert(
            name.to_string(),
            ClassEntry {
                parent: Some(info.base.to_string()),
                kind: ClassKind::Extension(Arc::new(ExtensionClass {
                    info,
                    exports,
                    dispatch,
                })),
            },
        );
        lock_or_recover(&self.extensions).push(name.to_string());
        Ok(())
    }

    /// Extension class names in registration order.
    pub fn extension_names(&self) -> Vec<String> {
        lock_or_recover(&self.extensions).clone()
    }

    /// Unregister every extension class, subclasses first.
    pub fn unregister_extensions(&self, engine: &dyn Engine) {
        let names: Vec<String> = lock_or_recover(&self.extensions).drain(..).rev().collect();
        for name in names {
            if let Err(e) = engine.unregister_class(&name) {
                log::warn!("unregistering `{name}` failed: {e}");
            }
            self.write().remove(&name);
        }
    }
}

/// Every class and method registration linked into the binary.
pub fn collected() -> (Vec<ExtensionClassInfo>, HashMap<&'static str, Vec<FuncInfo>>) {
    let classes: Vec<ExtensionClassInfo> = inventory::iter::<ClassRegistration>
        .into_iter()
        .map(|reg| (reg.info)())
        .collect();
    let mut methods: HashMap<&'static str, Vec<FuncInfo>> = HashMap::new();
    for reg in inventory::iter::<ClassMethodsRegistration> {
        methods.entry(reg.class).or_default().extend((reg.methods)());
    }
    (classes, methods)
}
