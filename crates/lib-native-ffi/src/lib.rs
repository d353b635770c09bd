//! # lib-native-ffi
//!
//! Safe call adapter for vendor shared libraries that report failures
//! through integer status codes.
//!
//! This crate turns "call an exported C function, inspect its exit code,
//! ask the vendor what the code means" into ordinary `Result`s. It handles:
//!
//! - Library resolution and loading with `libloading`
//! - Entry-point tables bound once at open, unusable after close
//! - String encoding and fixed-capacity output buffers
//! - Status checking with per-call ignore-sets and vendor error decoding
//! - Growing output buffers for results of unknown size
//! - Device session begin/end pairing and ordered teardown
//! - Timeouts for calls that block on hardware
//!
//! # Safety
//!
//! Vendor binaries are trusted to match their documented signatures; the
//! entry-point tables are the only place where that trust is expressed.
//! Everything above them is safe code.

pub mod adapter;
pub mod decoder;
pub mod error;
pub mod handle;
pub mod loader;
pub mod marshal;
pub mod retry;
pub mod session;
pub mod text;
pub mod watchdog;

pub use adapter::{CallAdapter, EnumNames, ErrorDecoder, MessageTable, NoDecoder};
pub use decoder::{decode_with_fallback, DECODE_ERROR_FUNCTION};
pub use error::{CallError, MarshalError, MarshalResult, NativeError, NativeResult};
pub use handle::NativeHandle;
pub use loader::{LibraryLocator, NativeLibrary};
pub use marshal::{to_native, FromNative};
pub use retry::{call_with_growing_buffer, BufferRequest, DEFAULT_INITIAL_CAPACITY};
pub use session::{DeviceSession, SessionState, Teardown};
pub use text::{OutBuffer, TextEncoding};
pub use watchdog::{orphaned_thread_count, Watchdog, WatchdogConfig};
