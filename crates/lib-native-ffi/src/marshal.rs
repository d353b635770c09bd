//! Conversion of raw native outputs into Rust values.
//!
//! A call closure returns its by-reference outputs in their native layout;
//! the adapter converts them only after the status code has been accepted,
//! so a failed call never has its (possibly garbage) buffers decoded.

use crate::error::{MarshalError, MarshalResult};
use crate::text::{OutBuffer, TextEncoding};

/// Raw native output convertible into a semantic value.
pub trait FromNative {
    type Output;

    fn from_native(self, encoding: TextEncoding) -> MarshalResult<Self::Output>;
}

macro_rules! identity_from_native {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromNative for $ty {
                type Output = $ty;

                #[inline]
                fn from_native(self, _: TextEncoding) -> MarshalResult<$ty> {
                    Ok(self)
                }
            }
        )*
    };
}

identity_from_native!((), bool, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl FromNative for OutBuffer {
    type Output = String;

    fn from_native(self, encoding: TextEncoding) -> MarshalResult<String> {
        self.decode(encoding)
    }
}

impl<T: FromNative> FromNative for Vec<T> {
    type Output = Vec<T::Output>;

    fn from_native(self, encoding: TextEncoding) -> MarshalResult<Self::Output> {
        self.into_iter().map(|v| v.from_native(encoding)).collect()
    }
}

impl<T: FromNative + Copy, const N: usize> FromNative for [T; N]
where
    T::Output: Copy + Default,
{
    type Output = [T::Output; N];

    fn from_native(self, encoding: TextEncoding) -> MarshalResult<Self::Output> {
        let mut out = [T::Output::default(); N];
        for (slot, raw) in out.iter_mut().zip(self) {
            *slot = raw.from_native(encoding)?;
        }
        Ok(out)
    }
}

macro_rules! tuple_from_native {
    ($($name:ident),+) => {
        impl<$($name: FromNative),+> FromNative for ($($name,)+) {
            type Output = ($($name::Output,)+);

            #[allow(non_snake_case)]
            fn from_native(self, encoding: TextEncoding) -> MarshalResult<Self::Output> {
                let ($($name,)+) = self;
                Ok(($($name.from_native(encoding)?,)+))
            }
        }
    };
}

tuple_from_native!(A);
tuple_from_native!(A, B);
tuple_from_native!(A, B, C);
tuple_from_native!(A, B, C, D);
tuple_from_native!(A, B, C, D, E);
tuple_from_native!(A, B, C, D, E, F);
tuple_from_native!(A, B, C, D, E, F, G);

/// Convert a Rust integer into the native argument type, rejecting values
/// that would be truncated.
pub fn to_native<T, U>(value: U, native: &'static str) -> MarshalResult<T>
where
    U: Copy + std::fmt::Display,
    T: TryFrom<U>,
{
    T::try_from(value).map_err(|_| MarshalError::out_of_range(value, native))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_outputs() {
        let mut label = OutBuffer::new(8);
        // SAFETY: buffer has 8 bytes.
        unsafe { std::ptr::copy_nonoverlapping(b"SOM 828\0".as_ptr(), label.as_mut_bytes(), 8) };
        let (count, text, flag) = (3i32, label, 1u8).from_native(TextEncoding::Ascii).unwrap();
        assert_eq!(count, 3);
        assert_eq!(text, "SOM 828");
        assert_eq!(flag, 1);
    }

    #[test]
    fn test_arrays_and_vectors() {
        let lengths: [i64; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(lengths.from_native(TextEncoding::Utf8).unwrap(), lengths);
        let data = vec![10i32, -20, 30];
        assert_eq!(data.clone().from_native(TextEncoding::Utf8).unwrap(), data);
    }

    #[test]
    fn test_undecodable_buffer_fails() {
        let mut buffer = OutBuffer::new(2);
        // SAFETY: buffer has 2 bytes.
        unsafe { *buffer.as_mut_bytes() = 0xff };
        assert!(matches!(
            buffer.from_native(TextEncoding::Utf8),
            Err(MarshalError::Undecodable { .. })
        ));
    }

    #[test]
    fn test_to_native_range() {
        let byte: u8 = to_native(200i32, "unsigned char").unwrap();
        assert_eq!(byte, 200);
        let err = to_native::<u8, i32>(256, "unsigned char").unwrap_err();
        assert_eq!(err, MarshalError::out_of_range(256, "unsigned char"));
        assert!(to_native::<u16, i64>(-1, "unsigned short").is_err());
    }
}
