//! Lenient decoding of integer codes into closed enumerations.
//!
//! Vendor libraries report modes and states as small integers. Firmware
//! revisions add values that no enumeration here knows about, so decoding
//! never fails: unrecognized codes come back as `Coded::Unknown` carrying the
//! raw integer. Callers that need strict membership match on `Known`.

use serde::{Serialize, Serializer};
use std::fmt;

/// An enumeration with a fixed integer code per variant.
///
/// Usually implemented through [`code_enum!`](crate::code_enum).
pub trait CodeEnum: Copy + Sized + 'static {
    /// Enumeration name used in diagnostics.
    const TYPE_NAME: &'static str;

    /// Map a raw code onto a variant.
    fn from_code(code: i32) -> Option<Self>;

    /// Raw code of this variant.
    fn code(self) -> i32;

    /// Symbolic variant name.
    fn name(self) -> &'static str;
}

/// Result of a lenient decode: a known variant or the raw code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Coded<E> {
    Known(E),
    Unknown(i32),
}

/// Decode `code` into `E`, preserving unrecognized values.
pub fn decode_enum<E: CodeEnum>(code: i32) -> Coded<E> {
    Coded::from_code(code)
}

impl<E: CodeEnum> Coded<E> {
    pub fn from_code(code: i32) -> Self {
        match E::from_code(code) {
            Some(known) => Self::Known(known),
            None => Self::Unknown(code),
        }
    }

    /// Raw integer, whichever variant this is.
    pub fn code(self) -> i32 {
        match self {
            Self::Known(known) => known.code(),
            Self::Unknown(code) => code,
        }
    }

    pub fn known(self) -> Option<E> {
        match self {
            Self::Known(known) => Some(known),
            Self::Unknown(_) => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, Self::Known(_))
    }

    pub fn name(self) -> Option<&'static str> {
        self.known().map(CodeEnum::name)
    }
}

impl<E: CodeEnum> From<E> for Coded<E> {
    fn from(known: E) -> Self {
        Self::Known(known)
    }
}

impl<E: CodeEnum> fmt::Display for Coded<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(known) => write!(f, "{} ({})", known.name(), known.code()),
            Self::Unknown(code) => write!(f, "{code}"),
        }
    }
}

impl<E: CodeEnum> Serialize for Coded<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(known) => serializer.serialize_str(known.name()),
            Self::Unknown(code) => serializer.serialize_i32(*code),
        }
    }
}

/// Declare a fieldless enum with explicit integer codes.
///
/// Generates the enum, a [`CodeEnum`] implementation, `TryFrom<i32>` (the
/// error is the rejected code) and `Display` (the variant name). Codes may be
/// negative; duplicate codes resolve to the first variant listed.
///
/// ```
/// lib_types::code_enum! {
///     pub enum WorkingMode {
///         StayPermanent = 0,
///         Volatile = 1,
///     }
/// }
///
/// use lib_types::{decode_enum, Coded};
/// assert_eq!(decode_enum::<WorkingMode>(1), Coded::Known(WorkingMode::Volatile));
/// assert_eq!(decode_enum::<WorkingMode>(7), Coded::Unknown(7));
/// ```
#[macro_export]
macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant
            ),+
        }

        impl $crate::coded::CodeEnum for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            #[allow(unreachable_patterns)]
            fn from_code(code: i32) -> Option<Self> {
                match code {
                    $(c if c == ($value) => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn code(self) -> i32 {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }

        impl ::std::convert::TryFrom<i32> for $name {
            type Error = i32;

            fn try_from(code: i32) -> Result<Self, i32> {
                <Self as $crate::coded::CodeEnum>::from_code(code).ok_or(code)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(<Self as $crate::coded::CodeEnum>::name(*self))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::code_enum! {
        enum Preset {
            FactoryDefaults = -1,
            CurrentSettings = 0,
            Preset1 = 1,
            Preset2 = 2,
        }
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        assert_eq!(decode_enum::<Preset>(99), Coded::Unknown(99));
        assert_eq!(decode_enum::<Preset>(99).code(), 99);
        assert!(!decode_enum::<Preset>(99).is_known());
    }

    #[test]
    fn test_known_codes() {
        assert_eq!(decode_enum::<Preset>(-1), Coded::Known(Preset::FactoryDefaults));
        assert_eq!(Preset::Preset2.code(), 2);
        assert_eq!(Preset::try_from(1), Ok(Preset::Preset1));
        assert_eq!(Preset::try_from(5), Err(5));
        assert_eq!(Preset::TYPE_NAME, "Preset");
    }

    #[test]
    fn test_display_and_serialize() {
        let known = decode_enum::<Preset>(0);
        assert_eq!(known.to_string(), "CurrentSettings (0)");
        assert_eq!(Coded::<Preset>::Unknown(42).to_string(), "42");
        assert_eq!(serde_json::to_string(&known).unwrap(), "\"CurrentSettings\"");
        assert_eq!(serde_json::to_string(&Coded::<Preset>::Unknown(-7)).unwrap(), "-7");
    }
}
