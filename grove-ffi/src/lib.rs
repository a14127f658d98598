// grove-ffi: #[repr(C)] types, handle types, engine interface table.
// Zero external dependencies. This crate defines the complete host ↔ engine contract.

pub mod handles;
pub mod error;
pub mod raw_variant;
pub mod interface;
pub mod callbacks;
pub mod registration;
pub mod contract_tests;

pub use handles::*;
pub use error::*;
pub use raw_variant::*;
pub use interface::*;
pub use callbacks::*;
pub use registration::*;
pub use grove_flags::*;
