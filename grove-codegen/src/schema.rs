// Serde types for the engine API descriptor (extension_api.json).
//
// Unknown fields are ignored so newer descriptors with extra sections still
// load; version compatibility is decided by `Header`, not by shape.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Descriptor {
    pub header: Header,
    #[serde(default)]
    pub global_enums: Vec<EnumDescriptor>,
    #[serde(default)]
    pub utility_functions: Vec<UtilityFunctionDescriptor>,
    #[serde(default)]
    pub builtin_classes: Vec<BuiltinClassDescriptor>,
    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,
    #[serde(default)]
    pub singletons: Vec<SingletonDescriptor>,
    #[serde(default)]
    pub native_structures: Vec<NativeStructureDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub version_major: u32,
    pub version_minor: u32,
    #[serde(default)]
    pub version_patch: u32,
    #[serde(default)]
    pub version_status: String,
    #[serde(default)]
    pub version_full_name: String,
    #[serde(default = "default_precision")]
    pub precision: String,
}

fn default_precision() -> String {
    "single".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumDescriptor {
    pub name: String,
    #[serde(default)]
    pub is_bitfield: bool,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConstantDescriptor {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    #[serde(default)]
    pub inherits: Option<String>,
    #[serde(default)]
    pub is_refcounted: bool,
    #[serde(default = "default_true")]
    pub is_instantiable: bool,
    #[serde(default)]
    pub api_type: String,
    #[serde(default)]
    pub constants: Vec<ConstantDescriptor>,
    #[serde(default)]
    pub enums: Vec<EnumDescriptor>,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
    #[serde(default)]
    pub signals: Vec<SignalDescriptor>,
}

/// Who owns an object returned from a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnOwnership {
    /// The engine hands the caller one reference.
    Owned,
    /// The caller must take its own reference to keep the object alive.
    Borrowed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_vararg: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub hash: Option<u32>,
    #[serde(default)]
    pub return_value: Option<ReturnValue>,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    #[serde(default)]
    pub return_ownership: Option<ReturnOwnership>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnValue {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub meta: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub meta: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    /// Object arguments are nullable unless the descriptor says otherwise.
    #[serde(default = "default_true")]
    pub nullable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub setter: Option<String>,
    #[serde(default)]
    pub getter: Option<String>,
    #[serde(default)]
    pub index: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalDescriptor {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuiltinClassDescriptor {
    pub name: String,
    #[serde(default)]
    pub enums: Vec<EnumDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UtilityFunctionDescriptor {
    pub name: String,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_vararg: bool,
    pub hash: u32,
    #[serde(default)]
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SingletonDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub class_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NativeStructureDescriptor {
    pub name: String,
    pub format: String,
}

impl MethodDescriptor {
    /// Argument type list used to tell overloads apart.
    pub fn signature(&self) -> Vec<&str> {
        self.arguments.iter().map(|a| a.type_name.as_str()).collect()
    }
}
