//! Core value types shared by every layer: derivation paths and addresses.

pub mod address;
pub mod path;

pub use address::{Address, AddressError};
pub use path::{normalize_component, parse_component, DerivationPath, KeyContext, PathError, PathField};
