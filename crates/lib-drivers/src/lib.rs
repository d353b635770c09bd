//! # lib-drivers
//!
//! Typed wrappers for vendor instrument libraries, built on
//! [`lib_native_ffi`]:
//!
//! - [`sepia2`]: PicoQuant Sepia II pulsed laser drivers
//! - [`andor`]: Andor SDK cameras and spectrometer CCDs
//! - [`attodry`]: attocube attoDRY cryostats
//! - [`apt`]: Thorlabs APT motion controllers
//!
//! Each driver binds the library's exports into a table of function
//! pointers once, at open. Every call then goes through the shared call
//! adapter, so failures carry the vendor's status code, the failing entry
//! point and, where the vendor provides one, its own description.
//!
//! ```no_run
//! use lib_drivers::sepia2::{self, Sepia2};
//!
//! # fn main() -> lib_native_ffi::NativeResult<()> {
//! let mut sepia = unsafe { Sepia2::open(None, sepia2::DEFAULT_ENCODING)? };
//! println!("Sepia II library {}", sepia.library_version()?);
//! sepia.close()
//! # }
//! ```

mod api;

pub mod andor;
pub mod apt;
pub mod attodry;
pub mod binding;
pub mod sepia2;

pub use andor::Andor;
pub use apt::Apt;
pub use attodry::AttoDry;
pub use binding::Binding;
pub use sepia2::Sepia2;
