//! The call adapter: the single place where native status codes become
//! Rust errors.
//!
//! Every native invocation goes through [`CallAdapter::invoke`]: a closure
//! marshals the arguments, calls the entry point and hands back the raw
//! status together with the raw by-reference outputs. The adapter then
//!
//! 1. maps marshaling failures to a [`CallError`] without a status code,
//! 2. accepts the success sentinel and any code in the ignore-set,
//! 3. otherwise asks the [`ErrorDecoder`] for the vendor message (a failing
//!    decoder yields no message, never a second error),
//! 4. converts the raw outputs with [`FromNative`].

use crate::error::{CallError, MarshalResult, NativeError, NativeResult};
use crate::marshal::FromNative;
use crate::text::TextEncoding;
use lib_types::{CodeEnum, StatusCode};
use std::ffi::c_int;
use std::marker::PhantomData;

/// Turns a status code into the vendor's description of it.
pub trait ErrorDecoder {
    /// Vendor message for `code`.
    fn decode(&self, code: StatusCode) -> NativeResult<String>;

    /// Symbolic name for `code`, when the vendor publishes one.
    fn code_name(&self, _code: StatusCode) -> Option<&'static str> {
        None
    }
}

/// Decoder for libraries that publish no messages.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDecoder;

impl ErrorDecoder for NoDecoder {
    fn decode(&self, _code: StatusCode) -> NativeResult<String> {
        Err(NativeError::NotSupported {
            operation: "decode-error".to_string(),
        })
    }
}

/// Decoder that only names codes, using a [`CodeEnum`] of exit codes.
#[derive(Clone, Copy, Debug)]
pub struct EnumNames<E>(PhantomData<E>);

impl<E> EnumNames<E> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: CodeEnum> ErrorDecoder for EnumNames<E> {
    fn decode(&self, _code: StatusCode) -> NativeResult<String> {
        Err(NativeError::NotSupported {
            operation: format!("{} messages", E::TYPE_NAME),
        })
    }

    fn code_name(&self, code: StatusCode) -> Option<&'static str> {
        E::from_code(code.get()).map(CodeEnum::name)
    }
}

/// Decoder backed by a compiled-in `(code, message)` table.
#[derive(Clone, Copy, Debug)]
pub struct MessageTable(pub &'static [(i32, &'static str)]);

impl ErrorDecoder for MessageTable {
    fn decode(&self, code: StatusCode) -> NativeResult<String> {
        self.0
            .iter()
            .find(|(c, _)| *c == code.get())
            .map(|(_, message)| (*message).to_string())
            .ok_or_else(|| CallError::status("decode-error", code, None).into())
    }
}

/// Per-library call context.
pub struct CallAdapter<'a> {
    library: &'a str,
    success: StatusCode,
    encoding: TextEncoding,
    decoder: &'a dyn ErrorDecoder,
}

impl<'a> CallAdapter<'a> {
    pub fn new(
        library: &'a str,
        success: StatusCode,
        encoding: TextEncoding,
        decoder: &'a dyn ErrorDecoder,
    ) -> Self {
        Self {
            library,
            success,
            encoding,
            decoder,
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn success(&self) -> StatusCode {
        self.success
    }

    /// Invoke a native function and convert its outputs.
    pub fn invoke<R, F>(&self, function: &str, ignore: &[StatusCode], call: F) -> NativeResult<R::Output>
    where
        R: FromNative,
        F: FnOnce() -> MarshalResult<(c_int, R)>,
    {
        self.invoke_with_status(function, ignore, call)
            .map(|(_, outputs)| outputs)
    }

    /// Like [`invoke`](Self::invoke), also returning the accepted status so
    /// callers can tell ignorable outcomes apart from plain success.
    pub fn invoke_with_status<R, F>(
        &self,
        function: &str,
        ignore: &[StatusCode],
        call: F,
    ) -> NativeResult<(StatusCode, R::Output)>
    where
        R: FromNative,
        F: FnOnce() -> MarshalResult<(c_int, R)>,
    {
        let (raw, outputs) = call().map_err(|e| CallError::marshal(function, e))?;
        let code = StatusCode::from(raw);
        self.check(function, code, ignore)?;
        let outputs = outputs
            .from_native(self.encoding)
            .map_err(|e| CallError::marshal(function, e))?;
        Ok((code, outputs))
    }

    /// Invoke a native function without outputs.
    pub fn invoke_status<F>(&self, function: &str, call: F) -> NativeResult<()>
    where
        F: FnOnce() -> MarshalResult<c_int>,
    {
        self.invoke(function, &[], || call().map(|code| (code, ())))
    }

    /// Accept `code` or build the error for it.
    pub fn check(&self, function: &str, code: StatusCode, ignore: &[StatusCode]) -> NativeResult<()> {
        if code == self.success {
            tracing::trace!(library = self.library, function, "Native call succeeded");
            return Ok(());
        }
        if code.is_in(ignore) {
            tracing::debug!(
                library = self.library,
                function,
                code = code.get(),
                "Ignoring non-fatal status"
            );
            return Ok(());
        }

        let message = match self.decoder.decode(code) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::debug!(
                    library = self.library,
                    code = code.get(),
                    error = %e,
                    "Could not decode status code"
                );
                None
            }
        };

        tracing::debug!(
            library = self.library,
            function,
            code = code.get(),
            message = message.as_deref().unwrap_or(""),
            "Native call failed"
        );

        Err(CallError::status(function, code, message)
            .with_code_name(self.decoder.code_name(code))
            .into())
    }
}
