//! # lib-types
//!
//! Core type definitions shared by the native driver crates.
//!
//! - Status codes returned by vendor entry points
//! - Packed per-channel bitmasks and their boolean expansion
//! - Lenient integer-to-enum decoding (`Coded<E>`)
//! - Device session states

pub mod bitmask;
pub mod coded;
pub mod error;
pub mod session;
pub mod status;

pub use bitmask::{decode_bitmask, decode_bits, encode_bitmask, encode_bits, BitMask8, MASK_WIDTH};
pub use coded::{decode_enum, CodeEnum, Coded};
pub use error::CodecError;
pub use session::SessionState;
pub use status::StatusCode;
