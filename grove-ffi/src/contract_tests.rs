// Compile-time contract tests: ensure layouts match the engine's expectations.
// These const assertions fail at compile time if sizes drift.

use std::mem::{align_of, size_of};

use crate::error::{CallError, CallErrorCode, GroveErrorCode};
use crate::handles::*;
use crate::raw_variant::*;

const _: () = assert!(size_of::<ObjectHandle>() == 16);
const _: () = assert!(size_of::<MethodBindPtr>() == 8);
const _: () = assert!(size_of::<RawStr>() == 16);
const _: () = assert!(size_of::<RawSlice>() == 16);
const _: () = assert!(size_of::<RawCallable>() == 48);
const _: () = assert!(size_of::<RawVariantData>() == 64);
const _: () = assert!(size_of::<RawVariant>() == 72);
const _: () = assert!(align_of::<RawVariant>() == 8);
const _: () = assert!(size_of::<GroveErrorCode>() == 4);
const _: () = assert!(size_of::<CallErrorCode>() == 4);
const _: () = assert!(size_of::<CallError>() == 12);
