//! Declaration of entry-point tables.

/// Declare a `Copy` table of entry points returning a status code, and a
/// `bind` constructor resolving each one by its exported name.
///
/// ```ignore
/// native_api! {
///     pub struct Api: extern "C" {
///         get_version = "SEPIA2_LIB_GetVersion": fn(*mut c_char);
///     }
/// }
/// ```
macro_rules! native_api {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : extern $abi:literal {
            $(
                $field:ident = $symbol:literal : fn($($arg:ty),* $(,)?);
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        $vis struct $name {
            $(pub $field: unsafe extern $abi fn($($arg),*) -> ::std::ffi::c_int,)+
        }

        impl $name {
            /// Every exported name in this table.
            pub const SYMBOLS: &'static [&'static str] = &[$($symbol),+];

            /// Resolve every entry point; fails on the first missing symbol.
            ///
            /// # Safety
            ///
            /// `library` must be the vendor library these signatures were
            /// written for.
            pub unsafe fn bind(
                library: &::lib_native_ffi::NativeLibrary,
            ) -> ::lib_native_ffi::NativeResult<Self> {
                Ok(Self {
                    $($field: unsafe { library.symbol($symbol)? },)+
                })
            }

            /// Table whose every entry returns [`crate::api::UNSTUBBED`].
            #[cfg(test)]
            pub(crate) fn stubbed() -> Self {
                $(
                    #[allow(non_snake_case)]
                    unsafe extern $abi fn $field($(_: $arg),*) -> ::std::ffi::c_int {
                        crate::api::UNSTUBBED
                    }
                )+
                Self { $($field,)+ }
            }
        }
    };
}

pub(crate) use native_api;

/// Status returned by entry points a test did not replace.
#[cfg(test)]
pub(crate) const UNSTUBBED: std::ffi::c_int = i32::MIN;
