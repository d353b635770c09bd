//! State shared by every driver: the open library, its text encoding and an
//! optional watchdog for blocking calls.

use lib_native_ffi::{
    CallAdapter, ErrorDecoder, LibraryLocator, NativeError, NativeHandle, NativeLibrary,
    NativeResult, TextEncoding, Watchdog,
};
use lib_types::StatusCode;
use std::ffi::c_int;
use std::path::Path;

/// A bound entry-point table `A` with its per-library settings.
pub struct Binding<A> {
    handle: NativeHandle<A>,
    encoding: TextEncoding,
    watchdog: Option<Watchdog>,
}

impl<A: Copy> Binding<A> {
    /// Resolve the library through `locator`, load it and bind its table.
    ///
    /// # Safety
    ///
    /// `bind` must describe the exports of the library found.
    pub unsafe fn open(
        locator: &LibraryLocator,
        path: Option<&Path>,
        encoding: TextEncoding,
        bind: impl FnOnce(&NativeLibrary) -> NativeResult<A>,
    ) -> NativeResult<Self> {
        let path = locator.resolve(path)?;
        let handle = unsafe { NativeHandle::open(locator.name, &path, bind)? };
        Ok(Self {
            handle,
            encoding,
            watchdog: None,
        })
    }

    pub fn from_api(name: &str, api: A, encoding: TextEncoding) -> Self {
        Self {
            handle: NativeHandle::from_api(name, api),
            encoding,
            watchdog: None,
        }
    }

    pub fn api(&self) -> NativeResult<A> {
        self.handle.api()
    }
}

impl<A> Binding<A> {
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn path(&self) -> Option<&Path> {
        self.handle.path()
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    pub fn set_watchdog(&mut self, watchdog: Option<Watchdog>) {
        self.watchdog = watchdog;
    }

    pub fn watchdog(&self) -> Option<&Watchdog> {
        self.watchdog.as_ref()
    }

    /// Adapter for one call, checking against `success`.
    pub fn adapter<'a>(&'a self, success: StatusCode, decoder: &'a dyn ErrorDecoder) -> CallAdapter<'a> {
        CallAdapter::new(self.handle.name(), success, self.encoding, decoder)
    }

    /// Run a call that may block on the hardware, under the watchdog when
    /// one is configured.
    pub fn blocking<F>(&self, call: F) -> NativeResult<c_int>
    where
        F: FnOnce() -> c_int + Send + 'static,
    {
        match &self.watchdog {
            Some(watchdog) => watchdog.run(call),
            None => Ok(call()),
        }
    }

    /// Unload the library.
    ///
    /// Calls still running under the watchdog are waited for up to its
    /// timeout; if they do not drain the library stays mapped and `Timeout`
    /// is returned.
    pub fn close(&mut self) -> NativeResult<()> {
        if let Some(watchdog) = &self.watchdog {
            let timeout = watchdog.config().timeout;
            if self.handle.is_open() && !watchdog.wait_idle(timeout) {
                return Err(NativeError::Timeout(timeout));
            }
        }
        self.handle.close()
    }
}

impl<A> Drop for Binding<A> {
    fn drop(&mut self) {
        if let Some(watchdog) = &self.watchdog {
            if self.handle.is_open() && !watchdog.wait_idle(watchdog.config().timeout) {
                self.handle.leak();
            }
        }
    }
}

impl<A> std::fmt::Debug for Binding<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("handle", &self.handle)
            .field("encoding", &self.encoding)
            .field("watchdog", &self.watchdog)
            .finish()
    }
}
