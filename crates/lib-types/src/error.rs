//! Errors raised by the local codecs.

use thiserror::Error;

/// Errors that can occur while packing or unpacking codec values.
///
/// These never involve a native call; drivers surface them as invalid
/// arguments before anything reaches the hardware.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Boolean sequence has the wrong number of entries.
    #[error("expected {expected} flags, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Requested mask width is outside 1..=32.
    #[error("mask width {0} is outside 1..=32")]
    InvalidWidth(usize),

    /// Packed value has bits set above the requested width.
    #[error("value {value:#x} does not fit in {width} bits")]
    ValueTooWide { value: u32, width: usize },
}

impl CodecError {
    /// Create a length mismatch error.
    pub fn invalid_length(expected: usize, actual: usize) -> Self {
        Self::InvalidLength { expected, actual }
    }
}
