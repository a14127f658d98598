// Export metadata.
//
// `ExportBuilder` turns the exported fields of an extension class into the
// property list the editor reflects on: validated hints, auto-tagged enums and
// object members, and group / subgroup scoping in declaration order.

use std::collections::HashSet;

use grove_ffi::{
    PROPERTY_HINT_COLOR_NO_ALPHA, PROPERTY_HINT_DIR, PROPERTY_HINT_ENUM, PROPERTY_HINT_EXP_EASING,
    PROPERTY_HINT_FILE, PROPERTY_HINT_FLAGS, PROPERTY_HINT_GLOBAL_DIR, PROPERTY_HINT_GLOBAL_FILE,
    PROPERTY_HINT_MULTILINE_TEXT, PROPERTY_HINT_NODE_TYPE, PROPERTY_HINT_NONE, PROPERTY_HINT_PASSWORD,
    PROPERTY_HINT_PLACEHOLDER_TEXT, PROPERTY_HINT_RANGE, PROPERTY_HINT_RESOURCE_TYPE,
    PROPERTY_USAGE_CLASS_IS_BITFIELD, PROPERTY_USAGE_CLASS_IS_ENUM, PROPERTY_USAGE_DEFAULT,
    PROPERTY_USAGE_NIL_IS_VARIANT,
};

use crate::callable::{Callable, Signal};
use crate::codec::{EngineBitfield, EngineEnum};
use crate::error::{GroveError, GroveResult};
use crate::math::*;
use crate::object::Gd;
use crate::traits::GodotClass;
use crate::variant::*;

pub const NODE_CLASS: &str = "Node";
pub const RESOURCE_CLASS: &str = "Resource";

/// Property or argument metadata as the engine receives it.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyInfo {
    pub name: String,
    pub variant_type: VariantType,
    /// Object class or scoped enum name; empty otherwise.
    pub class_name: String,
    pub hint: u32,
    pub hint_string: String,
    pub usage: u32,
}

impl PropertyInfo {
    /// Plain metadata for `name` of type `T`, with auto-tagging applied.
    pub fn of<T: ExportType>(name: &str) -> Self {
        let info = T::export_info();
        let (hint, hint_string) = auto_hint(&info).unwrap_or((PROPERTY_HINT_NONE, String::new()));
        PropertyInfo {
            name: name.to_string(),
            variant_type: info.variant_type,
            class_name: info.class_name.unwrap_or_default().to_string(),
            hint,
            hint_string,
            usage: info.usage(),
        }
    }
}

/// Static type facts the builder validates hints against.
#[derive(Clone, Copy, Debug)]
pub struct ExportTypeInfo {
    pub variant_type: VariantType,
    /// Static class for objects, engine name for enums and bitfields.
    pub class_name: Option<&'static str>,
    /// Inheritance test of the static class (objects only).
    pub inherits: Option<fn(&str) -> bool>,
    pub cases: Option<&'static [(&'static str, i64)]>,
    pub bitfield: bool,
    /// `Variant` itself: any type is accepted.
    pub any: bool,
}

impl ExportTypeInfo {
    pub const fn of(variant_type: VariantType) -> Self {
        ExportTypeInfo {
            variant_type,
            class_name: None,
            inherits: None,
            cases: None,
            bitfield: false,
            any: false,
        }
    }

    pub fn object<T: GodotClass>() -> Self {
        ExportTypeInfo {
            class_name: Some(T::CLASS_NAME),
            inherits: Some(T::inherits),
            ..Self::of(VariantType::Object)
        }
    }

    pub fn enumeration<T: EngineEnum>() -> Self {
        ExportTypeInfo {
            class_name: Some(T::ENGINE_NAME),
            cases: Some(T::cases()),
            ..Self::of(VariantType::Int)
        }
    }

    pub fn bitfield<T: EngineBitfield>() -> Self {
        ExportTypeInfo {
            class_name: Some(T::ENGINE_NAME),
            cases: Some(T::flags()),
            bitfield: true,
            ..Self::of(VariantType::Int)
        }
    }

    /// `true` for objects whose static class is `class` or derives from it.
    pub fn object_inherits(&self, class: &str) -> bool {
        self.variant_type == VariantType::Object && self.inherits.is_some_and(|f| f(class))
    }

    fn usage(&self) -> u32 {
        let mut usage = PROPERTY_USAGE_DEFAULT;
        if self.any {
            usage |= PROPERTY_USAGE_NIL_IS_VARIANT;
        }
        if self.cases.is_some() {
            usage |= if self.bitfield {
                PROPERTY_USAGE_CLASS_IS_BITFIELD
            } else {
                PROPERTY_USAGE_CLASS_IS_ENUM
            };
        }
        usage
    }
}

/// Types usable as exported members and registered method signatures.
pub trait ExportType {
    fn export_info() -> ExportTypeInfo;
}

macro_rules! export_as {
    ($($ty:ty => $vt:ident),* $(,)?) => {$(
        impl ExportType for $ty {
            fn export_info() -> ExportTypeInfo {
                ExportTypeInfo::of(VariantType::$vt)
            }
        }
    )*};
}

export_as! {
    () => Nil,
    bool => Bool,
    i8 => Int, i16 => Int, i32 => Int, i64 => Int,
    u8 => Int, u16 => Int, u32 => Int, u64 => Int,
    f32 => Float, f64 => Float,
    String => String,
    StringName => StringName,
    NodePath => NodePath,
    Vector2 => Vector2, Vector2i => Vector2i,
    Rect2 => Rect2, Rect2i => Rect2i,
    Vector3 => Vector3, Vector3i => Vector3i,
    Transform2D => Transform2D,
    Vector4 => Vector4, Vector4i => Vector4i,
    Plane => Plane,
    Quaternion => Quaternion,
    Aabb => Aabb,
    Basis => Basis,
    Transform3D => Transform3D,
    Projection => Projection,
    Color => Color,
    Rid => Rid,
    Callable => Callable,
    Signal => Signal,
    Dictionary => Dictionary,
    VariantArray => Array,
    PackedByteArray => PackedByteArray,
    PackedInt32Array => PackedInt32Array,
    PackedInt64Array => PackedInt64Array,
    PackedFloat32Array => PackedFloat32Array,
    PackedFloat64Array => PackedFloat64Array,
    PackedStringArray => PackedStringArray,
    PackedVector2Array => PackedVector2Array,
    PackedVector3Array => PackedVector3Array,
    PackedColorArray => PackedColorArray,
    PackedVector4Array => PackedVector4Array,
}

impl ExportType for Variant {
    fn export_info() -> ExportTypeInfo {
        ExportTypeInfo {
            any: true,
            ..ExportTypeInfo::of(VariantType::Nil)
        }
    }
}

impl<T: ExportType> ExportType for Vec<T> {
    fn export_info() -> ExportTypeInfo {
        ExportTypeInfo::of(VariantType::Array)
    }
}

impl<T: GodotClass> ExportType for Gd<T> {
    fn export_info() -> ExportTypeInfo {
        ExportTypeInfo::object::<T>()
    }
}

impl<T: ExportType> ExportType for Option<T> {
    fn export_info() -> ExportTypeInfo {
        T::export_info()
    }
}

/// Editor hint requested for an exported member.
#[derive(Clone, Debug, PartialEq)]
pub enum ExportHint {
    Range {
        min: f64,
        max: f64,
        step: Option<f64>,
        or_greater: bool,
        or_less: bool,
    },
    ExpEasing {
        attenuation: bool,
        positive_only: bool,
    },
    /// Explicit enum names, with optional values.
    Enum(Vec<(String, Option<i64>)>),
    Flags(Vec<(String, Option<i64>)>),
    /// File filters such as `*.png`.
    File(Vec<String>),
    GlobalFile(Vec<String>),
    Dir,
    GlobalDir,
    Multiline,
    Placeholder(String),
    Password,
    ColorNoAlpha,
    NodeType(String),
    ResourceType(String),
}

impl ExportHint {
    pub fn range(min: f64, max: f64) -> Self {
        ExportHint::Range {
            min,
            max,
            step: None,
            or_greater: false,
            or_less: false,
        }
    }

    pub fn range_step(min: f64, max: f64, step: f64) -> Self {
        ExportHint::Range {
            min,
            max,
            step: Some(step),
            or_greater: false,
            or_less: false,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ExportHint::Range { .. } => "range",
            ExportHint::ExpEasing { .. } => "exp_easing",
            ExportHint::Enum(_) => "enum",
            ExportHint::Flags(_) => "flags",
            ExportHint::File(_) => "file",
            ExportHint::GlobalFile(_) => "global_file",
            ExportHint::Dir => "dir",
            ExportHint::GlobalDir => "global_dir",
            ExportHint::Multiline => "multiline",
            ExportHint::Placeholder(_) => "placeholder",
            ExportHint::Password => "password",
            ExportHint::ColorNoAlpha => "color_no_alpha",
            ExportHint::NodeType(_) => "node_type",
            ExportHint::ResourceType(_) => "resource_type",
        }
    }

    /// Check the hint against the member's type.
    fn validate(&self, member: &str, ty: &ExportTypeInfo) -> GroveResult<()> {
        if ty.any {
            return Ok(());
        }
        let vt = ty.variant_type;
        let ok = match self {
            ExportHint::Range { .. } | ExportHint::ExpEasing { .. } => vt.is_numeric(),
            ExportHint::Enum(_) => matches!(vt, VariantType::Int | VariantType::String),
            ExportHint::Flags(_) => vt == VariantType::Int,
            ExportHint::File(_)
            | ExportHint::GlobalFile(_)
            | ExportHint::Dir
            | ExportHint::GlobalDir
            | ExportHint::Multiline
            | ExportHint::Placeholder(_)
            | ExportHint::Password => vt == VariantType::String,
            ExportHint::ColorNoAlpha => vt == VariantType::Color,
            ExportHint::NodeType(_) => ty.object_inherits(NODE_CLASS),
            ExportHint::ResourceType(_) => ty.object_inherits(RESOURCE_CLASS),
        };
        if ok {
            Ok(())
        } else {
            let found = match ty.class_name {
                Some(class) if vt == VariantType::Object => class.to_string(),
                _ => vt.to_string(),
            };
            Err(GroveError::HintValidation {
                member: member.to_string(),
                reason: format!("`{}` hint cannot apply to {found}", self.kind()),
            })
        }
    }

    fn encode(&self, ty: &ExportTypeInfo) -> (u32, String) {
        match self {
            ExportHint::Range {
                min,
                max,
                step,
                or_greater,
                or_less,
            } => {
                let mut s = format!("{min},{max}");
                if let Some(step) = step {
                    s.push_str(&format!(",{step}"));
                }
                if *or_greater {
                    s.push_str(",or_greater");
                }
                if *or_less {
                    s.push_str(",or_less");
                }
                (PROPERTY_HINT_RANGE, s)
            }
            ExportHint::ExpEasing {
                attenuation,
                positive_only,
            } => {
                let mut parts = Vec::new();
                if *attenuation {
                    parts.push("attenuation");
                }
                if *positive_only {
                    parts.push("positive_only");
                }
                (PROPERTY_HINT_EXP_EASING, parts.join(","))
            }
            ExportHint::Enum(values) => (PROPERTY_HINT_ENUM, join_named(values)),
            ExportHint::Flags(values) => (PROPERTY_HINT_FLAGS, join_named(values)),
            ExportHint::File(filters) => (PROPERTY_HINT_FILE, filters.join(",")),
            ExportHint::GlobalFile(filters) => (PROPERTY_HINT_GLOBAL_FILE, filters.join(",")),
            ExportHint::Dir => (PROPERTY_HINT_DIR, String::new()),
            ExportHint::GlobalDir => (PROPERTY_HINT_GLOBAL_DIR, String::new()),
            ExportHint::Multiline => (PROPERTY_HINT_MULTILINE_TEXT, String::new()),
            ExportHint::Placeholder(text) => (PROPERTY_HINT_PLACEHOLDER_TEXT, text.clone()),
            ExportHint::Password => (PROPERTY_HINT_PASSWORD, String::new()),
            ExportHint::ColorNoAlpha => (PROPERTY_HINT_COLOR_NO_ALPHA, String::new()),
            ExportHint::NodeType(class) => (PROPERTY_HINT_NODE_TYPE, non_empty_or(class, ty)),
            ExportHint::ResourceType(class) => (PROPERTY_HINT_RESOURCE_TYPE, non_empty_or(class, ty)),
        }
    }
}

fn join_named(values: &[(String, Option<i64>)]) -> String {
    values
        .iter()
        .map(|(name, value)| match value {
            Some(v) => format!("{name}:{v}"),
            None => name.clone(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn non_empty_or(class: &str, ty: &ExportTypeInfo) -> String {
    if class.is_empty() {
        ty.class_name.unwrap_or_default().to_string()
    } else {
        class.to_string()
    }
}

/// Hint derived from the type alone: enums, bitfields, node and resource
/// members.
fn auto_hint(ty: &ExportTypeInfo) -> Option<(u32, String)> {
    if let Some(cases) = ty.cases {
        let hint = if ty.bitfield { PROPERTY_HINT_FLAGS } else { PROPERTY_HINT_ENUM };
        let s = cases
            .iter()
            .map(|(name, value)| format!("{name}:{value}"))
            .collect::<Vec<_>>()
            .join(",");
        return Some((hint, s));
    }
    let class = ty.class_name?;
    if ty.object_inherits(NODE_CLASS) {
        Some((PROPERTY_HINT_NODE_TYPE, class.to_string()))
    } else if ty.object_inherits(RESOURCE_CLASS) {
        Some((PROPERTY_HINT_RESOURCE_TYPE, class.to_string()))
    } else {
        None
    }
}

/// One exported member with its resolved scope.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedMember {
    pub info: PropertyInfo,
    pub group: Option<String>,
    pub subgroup: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExportEntry {
    Group { name: String, prefix: String },
    Subgroup { name: String, prefix: String },
    Member(ExportedMember),
}

/// Immutable result of an [`ExportBuilder`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportList {
    entries: Vec<ExportEntry>,
}

impl ExportList {
    pub fn entries(&self) -> &[ExportEntry] {
        &self.entries
    }

    pub fn members(&self) -> impl Iterator<Item = &ExportedMember> {
        self.entries.iter().filter_map(|e| match e {
            ExportEntry::Member(m) => Some(m),
            _ => None,
        })
    }

    pub fn member(&self, name: &str) -> Option<&ExportedMember> {
        self.members().find(|m| m.info.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects exported members in declaration order.
///
/// Errors are deferred: the first one is reported by [`build`](Self::build).
#[derive(Debug)]
pub struct ExportBuilder {
    class: String,
    entries: Vec<ExportEntry>,
    names: HashSet<String>,
    group: Option<String>,
    subgroup: Option<String>,
    error: Option<GroveError>,
}

impl ExportBuilder {
    pub fn new(class: &str) -> Self {
        ExportBuilder {
            class: class.to_string(),
            entries: Vec::new(),
            names: HashSet::new(),
            group: None,
            subgroup: None,
            error: None,
        }
    }

    /// Start a group; an empty name closes the current one. Groups do not
    /// nest, and any open subgroup ends with its group.
    pub fn group(&mut self, name: &str, prefix: &str) -> &mut Self {
        self.group = (!name.is_empty()).then(|| name.to_string());
        self.subgroup = None;
        self.entries.push(ExportEntry::Group {
            name: name.to_string(),
            prefix: prefix.to_string(),
        });
        self
    }

    /// Start a subgroup inside the active group; an empty name closes it.
    pub fn subgroup(&mut self, name: &str, prefix: &str) -> &mut Self {
        if !name.is_empty() && self.group.is_none() {
            self.fail(GroveError::Registration(format!(
                "{}: subgroup `{name}` declared outside of a group",
                self.class
            )));
            return self;
        }
        self.subgroup = (!name.is_empty()).then(|| name.to_string());
        self.entries.push(ExportEntry::Subgroup {
            name: name.to_string(),
            prefix: prefix.to_string(),
        });
        self
    }

    pub fn member(&mut self, name: &str, ty: ExportTypeInfo, hint: Option<ExportHint>) -> &mut Self {
        if !self.names.insert(name.to_string()) {
            self.fail(GroveError::Registration(format!(
                "{}: member `{name}` exported twice",
                self.class
            )));
            return self;
        }
        let (hint, hint_string) = match hint {
            Some(hint) => {
                if let Err(e) = hint.validate(name, &ty) {
                    self.fail(e);
                    return self;
                }
                hint.encode(&ty)
            }
            None => auto_hint(&ty).unwrap_or((PROPERTY_HINT_NONE, String::new())),
        };
        self.entries.push(ExportEntry::Member(ExportedMember {
            info: PropertyInfo {
                name: name.to_string(),
                variant_type: ty.variant_type,
                class_name: ty.class_name.unwrap_or_default().to_string(),
                hint,
                hint_string,
                usage: ty.usage(),
            },
            group: self.group.clone(),
            subgroup: self.subgroup.clone(),
        }));
        self
    }

    fn fail(&mut self, error: GroveError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn build(&mut self) -> GroveResult<ExportList> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        Ok(ExportList {
            entries: std::mem::take(&mut self.entries),
        })
    }
}
