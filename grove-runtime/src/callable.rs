// Callable and Signal values.
//
// A callable is either a bound engine method (object + name) or a host
// closure. Host closures are invoked locally; bound methods go through the
// engine.

use std::fmt;
use std::sync::Arc;

use grove_ffi::{CallError, CallErrorCode};

use crate::codec::{FromVariant, ToVariant};
use crate::error::{GroveError, GroveResult};
use crate::object::ObjectRef;
use crate::variant::{StringName, Variant};

type CallableBody = dyn Fn(&[Variant]) -> GroveResult<Variant> + Send + Sync;

/// Host closure wrapped for the engine.
pub struct CustomCallable {
    name: String,
    body: Box<CallableBody>,
}

impl CustomCallable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self, args: &[Variant]) -> GroveResult<Variant> {
        (self.body)(args)
    }
}

impl fmt::Debug for CustomCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomCallable").field("name", &self.name).finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Default)]
pub enum Callable {
    #[default]
    Null,
    Method { object: ObjectRef, method: StringName },
    Custom(Arc<CustomCallable>),
}

impl Callable {
    /// Bound engine method.
    pub fn from_method(object: ObjectRef, method: impl Into<StringName>) -> Self {
        Callable::Method {
            object,
            method: method.into(),
        }
    }

    /// Untyped host closure over raw variants.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Variant]) -> GroveResult<Variant> + Send + Sync + 'static,
    {
        Callable::Custom(Arc::new(CustomCallable {
            name: name.into(),
            body: Box::new(f),
        }))
    }

    /// Typed host closure. Arguments are decoded with the codec, the result
    /// is encoded (`()` becomes nil). Wrong arity is a call error.
    pub fn from_closure<Args, F>(name: impl Into<String>, f: F) -> Self
    where
        F: IntoCallableFn<Args>,
    {
        let name = name.into();
        let label = name.clone();
        Self::from_fn(name, move |args| f.invoke(&label, args))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Callable::Null)
    }

    /// Invoke with already-encoded arguments.
    pub fn callv(&self, args: &[Variant]) -> GroveResult<Variant> {
        match self {
            Callable::Null => Err(GroveError::NullObject),
            Callable::Custom(custom) => custom.invoke(args),
            Callable::Method { object, .. } => object.context()?.call_callable(self, args),
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Null, Callable::Null) => true,
            (
                Callable::Method { object: a, method: m },
                Callable::Method { object: b, method: n },
            ) => a == b && m == n,
            (Callable::Custom(a), Callable::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Closures usable with [`Callable::from_closure`]. Implemented for `Fn`s of
/// up to five decodable arguments returning an encodable value.
pub trait IntoCallableFn<Args>: Send + Sync + 'static {
    fn invoke(&self, name: &str, args: &[Variant]) -> GroveResult<Variant>;
}

fn arity_error(name: &str, expected: usize, found: usize) -> GroveError {
    let code = if found > expected {
        CallErrorCode::TooManyArguments
    } else {
        CallErrorCode::TooFewArguments
    };
    GroveError::CallFailed {
        method: name.to_string(),
        error: CallError {
            code,
            argument: 0,
            expected: expected as u32,
        },
    }
}

macro_rules! impl_into_callable_fn {
    ($count:expr; $($ty:ident $val:ident),*) => {
        impl<F, R, $($ty,)*> IntoCallableFn<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> R + Send + Sync + 'static,
            R: ToVariant,
            $($ty: FromVariant,)*
        {
            fn invoke(&self, name: &str, args: &[Variant]) -> GroveResult<Variant> {
                let [$($val),*] = args else {
                    return Err(arity_error(name, $count, args.len()));
                };
                Ok((self)($($ty::from_variant($val)?),*).to_variant())
            }
        }
    };
}

impl_into_callable_fn!(0;);
impl_into_callable_fn!(1; A a);
impl_into_callable_fn!(2; A a, B b);
impl_into_callable_fn!(3; A a, B b, C c);
impl_into_callable_fn!(4; A a, B b, C c, D d);
impl_into_callable_fn!(5; A a, B b, C c, D d, E e);

/// Signal on an engine object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Signal {
    pub object: Option<ObjectRef>,
    pub name: StringName,
}

impl Signal {
    pub fn new(object: ObjectRef, name: impl Into<StringName>) -> Self {
        Signal {
            object: Some(object),
            name: name.into(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.object.is_none()
    }
}
