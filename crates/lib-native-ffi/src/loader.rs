//! Dynamic library resolution and loading.
//!
//! A library is located from an explicit path, from a vendor default
//! install path, or by searching the working directory and the platform
//! library path variables for the vendor's library name.

use crate::error::{NativeError, NativeResult};
use libloading::Library;
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Where to look for a vendor library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryLocator {
    /// Bare library name without platform prefix or extension, e.g. `Sepia2_Lib`.
    pub name: &'static str,
    /// Vendor install location tried when no explicit path is given.
    pub default_path: Option<&'static str>,
}

impl LibraryLocator {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            default_path: None,
        }
    }

    pub const fn with_default(name: &'static str, default_path: &'static str) -> Self {
        Self {
            name,
            default_path: Some(default_path),
        }
    }

    /// Resolve a library file.
    ///
    /// An explicit argument that names an existing file wins. Any other
    /// explicit argument is treated as a library name to search for. Without
    /// an argument the vendor default path is tried, then the search for
    /// [`Self::name`].
    pub fn resolve(&self, explicit: Option<&Path>) -> NativeResult<PathBuf> {
        let mut searched = Vec::new();

        let name: &OsStr = match explicit {
            Some(path) if path.is_file() => return Ok(path.to_path_buf()),
            Some(path) => {
                searched.push(path.to_path_buf());
                path.as_os_str()
            }
            None => {
                if let Some(default) = self.default_path {
                    let default = PathBuf::from(default);
                    if default.is_file() {
                        return Ok(default);
                    }
                    searched.push(default);
                }
                OsStr::new(self.name)
            }
        };

        for dir in search_dirs() {
            for candidate in candidate_names(name) {
                let path = dir.join(&candidate);
                if path.is_file() {
                    tracing::debug!(path = %path.display(), "Resolved native library");
                    return Ok(path);
                }
                searched.push(path);
            }
        }

        Err(NativeError::LibraryNotFound {
            name: name.to_string_lossy().into_owned(),
            searched,
        })
    }
}

/// File names tried for a bare library name: as given, then with the
/// platform prefix and extension.
fn candidate_names(name: &OsStr) -> Vec<PathBuf> {
    let mut names = vec![PathBuf::from(name)];
    let platform = PathBuf::from(libloading::library_filename(name));
    if !names.contains(&platform) {
        names.push(platform);
    }
    names
}

/// Working directory followed by the entries of the platform library path.
fn search_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = env::current_dir().into_iter().collect();
    let vars: &[&str] = if cfg!(target_os = "windows") {
        &["PATH"]
    } else if cfg!(target_os = "macos") {
        &["DYLD_LIBRARY_PATH"]
    } else {
        &["LD_LIBRARY_PATH"]
    };
    for var in vars {
        if let Some(value) = env::var_os(var) {
            dirs.extend(env::split_paths(&value));
        }
    }
    dirs
}

/// A loaded shared library.
///
/// Dropping it unmaps the library; [`NativeLibrary::close`] does the same
/// but reports unload failures.
#[derive(Debug)]
pub struct NativeLibrary {
    library: Library,
    path: PathBuf,
}

impl NativeLibrary {
    /// Load a library from `path`.
    ///
    /// # Safety
    ///
    /// Loading runs the library's initialization routines. The library must
    /// be the vendor binary it claims to be.
    pub unsafe fn load<P: AsRef<Path>>(path: P) -> NativeResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let library = unsafe { Library::new(path) }
            .map_err(|e| NativeError::load_error(&path_str, e))?;

        tracing::info!(path = %path_str, "Loaded native library");

        Ok(Self {
            library,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy an exported function pointer out of the library.
    ///
    /// # Safety
    ///
    /// `T` must be the exact `extern "C"` function pointer type of the export.
    /// The pointer is only valid while this library stays loaded.
    pub unsafe fn symbol<T: Copy>(&self, name: &str) -> NativeResult<T> {
        unsafe {
            self.library
                .get::<T>(name.as_bytes())
                .map(|symbol| *symbol)
                .map_err(|_| NativeError::symbol_not_found(self.path.display().to_string(), name))
        }
    }

    /// Unmap the library.
    pub fn close(self) -> NativeResult<()> {
        let path = self.path.display().to_string();
        self.library
            .close()
            .map_err(|e| NativeError::load_error(&path, e))?;
        tracing::info!(path = %path, "Unloaded native library");
        Ok(())
    }
}
