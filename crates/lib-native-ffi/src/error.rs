//! Error types for native library operations.

use crate::text::TextEncoding;
use lib_types::{CodecError, SessionState, StatusCode};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while converting between Rust values and native layouts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// String argument contains an interior NUL byte.
    #[error("string argument '{name}' contains an interior NUL byte")]
    InteriorNul { name: String },

    /// String argument cannot be represented in the library encoding.
    #[error("cannot encode {text:?} as {encoding}")]
    Unencodable { encoding: TextEncoding, text: String },

    /// Output buffer is not valid in the library encoding.
    #[error("native output is not valid {encoding}")]
    Undecodable { encoding: TextEncoding },

    /// Value does not fit the native integer type.
    #[error("value {value} does not fit native type {native}")]
    OutOfRange { value: String, native: &'static str },

    /// Buffer capacity cannot be expressed in the native length argument.
    #[error("buffer capacity {0} exceeds the native length type")]
    CapacityOverflow(usize),
}

impl MarshalError {
    /// Create an out-of-range error for `value` converted to `native`.
    pub fn out_of_range(value: impl fmt::Display, native: &'static str) -> Self {
        Self::OutOfRange {
            value: value.to_string(),
            native,
        }
    }
}

/// Result type for marshaling steps.
pub type MarshalResult<T> = Result<T, MarshalError>;

/// A failed library call.
///
/// Produced by the call adapter for both native failures (a non-success
/// status code) and local marshaling failures (no status code, `cause` set).
/// The message, when present, is the vendor's own text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallError {
    /// Status code returned by the native function.
    pub code: Option<StatusCode>,
    /// Symbolic name of `code` from a vendor table.
    pub code_name: Option<&'static str>,
    /// Vendor message for `code`.
    pub message: Option<String>,
    /// Native entry point that failed.
    pub function: Option<String>,
    /// Local marshaling failure.
    pub cause: Option<MarshalError>,
}

impl CallError {
    /// A native call returned a non-success status.
    pub fn status(function: impl Into<String>, code: StatusCode, message: Option<String>) -> Self {
        Self {
            code: Some(code),
            code_name: None,
            message,
            function: Some(function.into()),
            cause: None,
        }
    }

    /// Argument or output marshaling failed around a native call.
    pub fn marshal(function: impl Into<String>, cause: MarshalError) -> Self {
        Self {
            code: None,
            code_name: None,
            message: None,
            function: Some(function.into()),
            cause: Some(cause),
        }
    }

    pub fn with_code_name(mut self, name: Option<&'static str>) -> Self {
        self.code_name = name;
        self
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function {
            Some(function) => write!(f, "Library function '{function}' ")?,
            None => f.write_str("A library function ")?,
        }
        match (self.code, self.code_name) {
            (Some(code), Some(name)) => write!(f, "failed with {code} ({name})")?,
            (Some(code), None) => write!(f, "failed with {code}")?,
            (None, _) => f.write_str("failed unexpectedly")?,
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        } else if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|c| c as &(dyn std::error::Error + 'static))
    }
}

/// Errors that can occur while loading or calling a native library.
#[derive(Debug, Error)]
pub enum NativeError {
    /// No file resolved for the requested library.
    #[error("Library '{name}' not found (searched {} locations)", .searched.len())]
    LibraryNotFound { name: String, searched: Vec<PathBuf> },

    /// The loader rejected the file.
    #[error("Failed to load library '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: libloading::Error,
    },

    /// Required entry point missing from the library.
    #[error("Symbol '{symbol}' not found in library '{library}'")]
    SymbolNotFound { library: String, symbol: String },

    /// The library is closed (or was never opened).
    #[error("Library '{library}' is not initialized")]
    NotInitialized { library: String },

    /// A native call failed.
    #[error(transparent)]
    Call(#[from] CallError),

    /// Argument rejected before any native call.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    /// Session operation issued in the wrong state.
    #[error("Invalid session state: expected {expected:?}, got {actual:?}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    /// Operation not available for this library.
    #[error("Operation '{operation}' not supported")]
    NotSupported { operation: String },

    /// Blocking call exceeded the watchdog timeout.
    #[error("Native call timed out after {0:?}")]
    Timeout(Duration),

    /// Code executed under the watchdog panicked.
    #[error("Native call panicked: {0}")]
    Panicked(String),

    /// Too many orphaned threads from previous timeouts.
    #[error("Too many orphaned threads ({count}), max allowed is {max}")]
    TooManyOrphanedThreads { count: usize, max: usize },
}

impl NativeError {
    /// Create a load error.
    pub fn load_error(path: impl Into<String>, source: libloading::Error) -> Self {
        Self::LoadError {
            path: path.into(),
            source,
        }
    }

    /// Create a symbol not found error.
    pub fn symbol_not_found(library: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::SymbolNotFound {
            library: library.into(),
            symbol: symbol.into(),
        }
    }

    /// Create a not initialized error.
    pub fn not_initialized(library: impl Into<String>) -> Self {
        Self::NotInitialized {
            library: library.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(expected: SessionState, actual: SessionState) -> Self {
        Self::InvalidState { expected, actual }
    }

    /// The failed call, if this is a call failure.
    pub fn as_call(&self) -> Option<&CallError> {
        match self {
            Self::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Native status code carried by this error, if any.
    pub fn status_code(&self) -> Option<StatusCode> {
        self.as_call().and_then(|call| call.code)
    }

    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::NotInitialized { .. })
    }

    /// Whether the library handle should be considered unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::LoadError { .. } | Self::Panicked(_) | Self::TooManyOrphanedThreads { .. }
        )
    }
}

impl From<CodecError> for NativeError {
    /// Channel flags that do not fit a register are rejected before the call.
    fn from(err: CodecError) -> Self {
        Self::invalid_argument("channels", err)
    }
}

/// Result type for native library operations.
pub type NativeResult<T> = Result<T, NativeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_code_name_and_message() {
        let err = CallError::status("GetStatus", StatusCode(20075), Some("not ready".into()))
            .with_code_name(Some("DRV_NOT_INITIALIZED"));
        assert_eq!(
            err.to_string(),
            "Library function 'GetStatus' failed with 20075 (DRV_NOT_INITIALIZED): not ready"
        );
    }

    #[test]
    fn test_display_without_message() {
        let err = CallError::status("SEPIA2_FWR_GetVersion", StatusCode(-9001), None);
        assert_eq!(
            err.to_string(),
            "Library function 'SEPIA2_FWR_GetVersion' failed with -9001"
        );
    }

    #[test]
    fn test_marshal_error_has_no_code() {
        let err = CallError::marshal(
            "AttoDRY_Interface_Connect",
            MarshalError::InteriorNul { name: "com_port".into() },
        );
        assert!(err.code.is_none());
        assert_eq!(err.function.as_deref(), Some("AttoDRY_Interface_Connect"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("failed unexpectedly"));
    }

    #[test]
    fn test_anonymous_failure() {
        let err = CallError {
            code: None,
            code_name: None,
            message: None,
            function: None,
            cause: Some(MarshalError::CapacityOverflow(usize::MAX)),
        };
        assert!(err.to_string().starts_with("A library function failed unexpectedly"));
    }

    #[test]
    fn test_status_code_accessor() {
        let err: NativeError = CallError::status("CoolerON", StatusCode(20013), None).into();
        assert_eq!(err.status_code(), Some(StatusCode(20013)));
        assert!(!err.is_not_initialized());
        assert!(NativeError::not_initialized("APT").is_not_initialized());
    }

    #[test]
    fn test_codec_error_is_invalid_argument() {
        let err: NativeError = lib_types::encode_bitmask(&[true; 7]).unwrap_err().into();
        match err {
            NativeError::InvalidArgument { name, reason } => {
                assert_eq!(name, "channels");
                assert_eq!(reason, "expected 8 flags, got 7");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!NativeError::from(CodecError::InvalidWidth(0)).is_fatal());
    }
}
