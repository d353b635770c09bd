//! Buffer growth for outputs of unknown size.
//!
//! Some entry points render text into a caller-allocated buffer and report a
//! dedicated "buffer too small" status when it does not fit. The wrapper
//! starts at [`DEFAULT_INITIAL_CAPACITY`] and doubles until the call returns
//! anything else. There is no upper bound: a library that keeps
//! asking for more grows until the capacity no longer fits the native length
//! argument.

use crate::adapter::CallAdapter;
use crate::error::{CallError, MarshalError, MarshalResult, NativeResult};
use crate::text::OutBuffer;
use lib_types::StatusCode;
use std::ffi::c_int;

/// Starting capacity for variable-length outputs.
pub const DEFAULT_INITIAL_CAPACITY: usize = 8192;

/// Sizing hint for one logical call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferRequest {
    capacity: usize,
}

impl BufferRequest {
    /// Growth factor applied after each exhausted attempt.
    pub const GROWTH: usize = 2;

    pub fn new(initial: usize) -> Self {
        Self {
            capacity: initial.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Double the capacity.
    pub fn grow(&mut self) -> MarshalResult<()> {
        self.capacity = self
            .capacity
            .checked_mul(Self::GROWTH)
            .ok_or(MarshalError::CapacityOverflow(self.capacity))?;
        Ok(())
    }
}

impl Default for BufferRequest {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_CAPACITY)
    }
}

/// Call `call` with growing buffers until its status is not `exhausted`.
///
/// The first non-exhaustion status goes through normal adapter checking; on
/// success the buffer is decoded with the adapter's encoding.
pub fn call_with_growing_buffer<F>(
    adapter: &CallAdapter<'_>,
    function: &str,
    exhausted: StatusCode,
    mut request: BufferRequest,
    mut call: F,
) -> NativeResult<String>
where
    F: FnMut(&mut OutBuffer) -> MarshalResult<c_int>,
{
    let mut attempts = 0usize;
    loop {
        let mut buffer = OutBuffer::new(request.capacity());
        attempts += 1;
        let code = StatusCode::from(call(&mut buffer).map_err(|e| CallError::marshal(function, e))?);

        if code == exhausted {
            tracing::debug!(
                function,
                capacity = request.capacity(),
                attempts,
                "Output buffer too small, growing"
            );
            request.grow().map_err(|e| CallError::marshal(function, e))?;
            continue;
        }

        adapter.check(function, code, &[])?;
        tracing::debug!(function, capacity = request.capacity(), attempts, "Variable-length output complete");
        return buffer
            .decode(adapter.encoding())
            .map_err(|e| CallError::marshal(function, e).into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::NoDecoder;
    use crate::text::TextEncoding;

    const EXHAUSTED: StatusCode = StatusCode(-1001);

    /// Stub that needs `required` bytes; returns the number of calls made.
    fn run(required: usize, initial: usize) -> (NativeResult<String>, usize, Vec<usize>) {
        let adapter = CallAdapter::new("Stub", StatusCode::ZERO, TextEncoding::Utf8, &NoDecoder);
        let mut capacities = Vec::new();
        let result = call_with_growing_buffer(
            &adapter,
            "SEPIA2_FWR_CreateSupportRequestText",
            EXHAUSTED,
            BufferRequest::new(initial),
            |buffer| {
                capacities.push(buffer.capacity());
                if buffer.capacity() < required {
                    return Ok(EXHAUSTED.get());
                }
                let text = b"support request";
                // SAFETY: capacity >= required >= 16 in every test below.
                unsafe {
                    std::ptr::copy_nonoverlapping(text.as_ptr(), buffer.as_mut_bytes(), text.len())
                };
                Ok(0)
            },
        );
        let calls = capacities.len();
        (result, calls, capacities)
    }

    fn expected_calls(required: usize, initial: usize) -> usize {
        let mut calls = 1;
        let mut capacity = initial;
        while capacity < required {
            capacity *= 2;
            calls += 1;
        }
        calls
    }

    #[test]
    fn test_fits_first_time() {
        let (result, calls, _) = run(100, DEFAULT_INITIAL_CAPACITY);
        assert_eq!(result.unwrap(), "support request");
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_call_count_is_log2_plus_one() {
        // ceil(log2(X / 8192)) + 1
        for (required, calls) in [(8192, 1), (8193, 2), (16384, 2), (65536, 4), (100_000, 5), (1 << 20, 8)] {
            let (result, actual, capacities) = run(required, DEFAULT_INITIAL_CAPACITY);
            assert!(result.is_ok());
            assert_eq!(actual, calls, "required {required}");
            assert_eq!(actual, expected_calls(required, DEFAULT_INITIAL_CAPACITY));
            assert!(capacities.windows(2).all(|w| w[1] == w[0] * 2));
            assert!(*capacities.last().unwrap() >= required);
        }
    }

    #[test]
    fn test_other_failure_stops_growth() {
        let adapter = CallAdapter::new("Stub", StatusCode::ZERO, TextEncoding::Utf8, &NoDecoder);
        let mut calls = 0;
        let err = call_with_growing_buffer(
            &adapter,
            "SEPIA2_FWR_CreateSupportRequestText",
            EXHAUSTED,
            BufferRequest::default(),
            |_| {
                calls += 1;
                Ok(if calls < 3 { EXHAUSTED.get() } else { -9005 })
            },
        )
        .unwrap_err();
        assert_eq!(calls, 3);
        assert_eq!(err.status_code(), Some(StatusCode(-9005)));
    }

    #[test]
    fn test_growth_overflow_is_reported() {
        let mut request = BufferRequest::new(usize::MAX / 2 + 1);
        assert_eq!(
            request.grow(),
            Err(MarshalError::CapacityOverflow(usize::MAX / 2 + 1))
        );
        let mut small = BufferRequest::new(0);
        assert_eq!(small.capacity(), 1);
        small.grow().unwrap();
        assert_eq!(small.capacity(), 2);
    }
}
