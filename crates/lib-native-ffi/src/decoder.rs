//! Two-level decoding for libraries that export their own error decoder.
//!
//! A native decoder reports failure with a status code of its own ("decoding
//! your error failed, here is why"). That secondary code is decoded exactly
//! once more. Whatever happens on the second attempt, the caller gets an
//! error: a message that only explains why decoding failed must never be
//! passed off as the description of the original code.

use crate::error::{CallError, MarshalResult, NativeResult};
use crate::text::{OutBuffer, TextEncoding};
use lib_types::StatusCode;

/// Function name reported when decoding itself fails.
pub const DECODE_ERROR_FUNCTION: &str = "decode-error";

/// Decode `code` through `raw`, retrying once on the decoder's own failure.
///
/// `raw` performs one native decode attempt and returns the decoder's status
/// and the filled text buffer. It is called at most twice.
pub fn decode_with_fallback<F>(
    function: &str,
    code: StatusCode,
    success: StatusCode,
    encoding: TextEncoding,
    mut raw: F,
) -> NativeResult<String>
where
    F: FnMut(StatusCode) -> MarshalResult<(StatusCode, OutBuffer)>,
{
    let (status, buffer) = raw(code).map_err(|e| CallError::marshal(function, e))?;
    if status == success {
        return buffer
            .decode(encoding)
            .map_err(|e| CallError::marshal(function, e).into());
    }

    let secondary = status;
    let message = match raw(secondary) {
        Ok((status, buffer)) if status == success => buffer.decode(encoding).ok(),
        Ok((status, _)) => {
            tracing::debug!(
                code = code.get(),
                secondary = secondary.get(),
                status = status.get(),
                "Secondary error decode failed"
            );
            None
        }
        Err(e) => {
            tracing::debug!(code = code.get(), error = %e, "Secondary error decode failed");
            None
        }
    };

    Err(CallError::status(function, secondary, message).into())
}
