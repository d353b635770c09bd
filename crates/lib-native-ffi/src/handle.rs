//! Ownership of a loaded library and its bound entry points.

use crate::error::{NativeError, NativeResult};
use crate::loader::NativeLibrary;
use std::cell::Cell;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A loaded vendor library together with its table of entry points `A`.
///
/// `A` is a `Copy` struct of `extern "C"` function pointers bound at open.
/// The pointers are only handed out while the handle is open; after
/// [`NativeHandle::close`] every access fails with `NotInitialized`.
///
/// # Thread Safety
///
/// Vendor libraries in this family keep per-process device state and are
/// not safe to call concurrently. The handle is `Send` but intentionally
/// `!Sync`; wrap it in a `Mutex` to share it.
pub struct NativeHandle<A> {
    name: String,
    path: Option<PathBuf>,
    library: Option<NativeLibrary>,
    api: Option<A>,
    _not_sync: PhantomData<Cell<()>>,
}

impl<A: Copy> NativeHandle<A> {
    /// Load the library at `path` and bind its entry points with `bind`.
    ///
    /// # Safety
    ///
    /// `bind` must use the exact vendor signatures for every symbol.
    pub unsafe fn open(
        name: impl Into<String>,
        path: &Path,
        bind: impl FnOnce(&NativeLibrary) -> NativeResult<A>,
    ) -> NativeResult<Self> {
        let library = unsafe { NativeLibrary::load(path)? };
        let api = match bind(&library) {
            Ok(api) => api,
            Err(e) => {
                if let Err(close_err) = library.close() {
                    tracing::warn!(error = %close_err, "Failed to unload library after bind failure");
                }
                return Err(e);
            }
        };
        Ok(Self {
            name: name.into(),
            path: Some(path.to_path_buf()),
            library: Some(library),
            api: Some(api),
            _not_sync: PhantomData,
        })
    }

    /// Wrap an entry-point table that is not backed by a loaded file
    /// (functions linked into the current process).
    pub fn from_api(name: impl Into<String>, api: A) -> Self {
        Self {
            name: name.into(),
            path: None,
            library: None,
            api: Some(api),
            _not_sync: PhantomData,
        }
    }

    /// Entry-point table, or `NotInitialized` once closed.
    pub fn api(&self) -> NativeResult<A> {
        self.api.ok_or_else(|| NativeError::not_initialized(&self.name))
    }
}

impl<A> NativeHandle<A> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.api.is_some()
    }

    /// Release the entry points and unmap the library.
    ///
    /// Single use: a second call returns `NotInitialized` and never touches
    /// the mapping again.
    pub fn close(&mut self) -> NativeResult<()> {
        if self.api.take().is_none() {
            return Err(NativeError::not_initialized(&self.name));
        }
        match self.library.take() {
            Some(library) => library.close(),
            None => {
                tracing::debug!(library = %self.name, "Closed in-process entry table");
                Ok(())
            }
        }
    }

    /// Release the entry points but keep the library mapped for the rest of
    /// the process. For when a thread may still be executing inside it.
    pub fn leak(&mut self) {
        if self.api.take().is_none() {
            return;
        }
        if let Some(library) = self.library.take() {
            tracing::warn!(library = %self.name, "Leaving library mapped, calls still in flight");
            std::mem::forget(library);
        }
    }
}

impl<A> Drop for NativeHandle<A> {
    fn drop(&mut self) {
        if self.is_open() {
            // Best-effort close, log but don't propagate errors
            if let Err(e) = self.close() {
                tracing::warn!(library = %self.name, error = %e, "Error during library cleanup");
            }
        }
    }
}

impl<A> std::fmt::Debug for NativeHandle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeHandle")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::c_int;

    #[derive(Clone, Copy, Debug)]
    struct Api {
        ping: unsafe extern "C" fn() -> c_int,
    }

    unsafe extern "C" fn ping() -> c_int {
        7
    }

    #[test]
    fn test_calls_fail_after_close() {
        let mut handle = NativeHandle::from_api("Stub", Api { ping });
        let api = handle.api().unwrap();
        assert_eq!(unsafe { (api.ping)() }, 7);

        handle.close().unwrap();
        assert!(!handle.is_open());
        assert!(handle.api().unwrap_err().is_not_initialized());
    }

    #[test]
    fn test_second_close_is_rejected() {
        let mut handle = NativeHandle::from_api("Stub", Api { ping });
        handle.close().unwrap();
        let err = handle.close().unwrap_err();
        assert!(matches!(err, NativeError::NotInitialized { ref library } if library == "Stub"));
    }

    #[test]
    fn test_leak_releases_entry_points() {
        let mut handle = NativeHandle::from_api("Stub", Api { ping });
        handle.leak();
        assert!(!handle.is_open());
        assert!(handle.api().unwrap_err().is_not_initialized());
        assert!(handle.close().unwrap_err().is_not_initialized());
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing_vendor_lib.so");
        let result = unsafe {
            NativeHandle::<Api>::open("Missing", &missing, |_| unreachable!("bind must not run"))
        };
        assert!(matches!(result, Err(NativeError::LoadError { .. })));
    }
}
