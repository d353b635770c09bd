//! Text encoding at the native boundary.
//!
//! Every library instance fixes one encoding at construction and applies it
//! to all string arguments and string outputs. String outputs are written by
//! the library into caller-allocated, fixed-capacity, NUL-terminated buffers.

use crate::error::{MarshalError, MarshalResult};
use serde::{Deserialize, Serialize};
use std::ffi::{c_char, CString};
use std::fmt;
use std::str::FromStr;

/// Encoding used for native strings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextEncoding {
    /// 7-bit ASCII.
    #[serde(rename = "ascii")]
    Ascii,
    /// UTF-8.
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    /// ISO-8859-1.
    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
}

impl TextEncoding {
    /// Encode `text` without a terminator.
    pub fn encode(self, text: &str) -> MarshalResult<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Ascii if text.is_ascii() => Ok(text.as_bytes().to_vec()),
            Self::Ascii => Err(self.unencodable(text)),
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| self.unencodable(text)))
                .collect(),
        }
    }

    /// Encode `text` as a NUL-terminated argument named `name`.
    pub fn to_c_string(self, name: &str, text: &str) -> MarshalResult<CString> {
        CString::new(self.encode(text)?).map_err(|_| MarshalError::InteriorNul {
            name: name.to_string(),
        })
    }

    /// Decode bytes up to the first NUL (or the whole slice).
    pub fn decode(self, bytes: &[u8]) -> MarshalResult<String> {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let bytes = &bytes[..end];
        match self {
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| MarshalError::Undecodable { encoding: self }),
            Self::Ascii if bytes.is_ascii() => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Ascii => Err(MarshalError::Undecodable { encoding: self }),
            Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    fn unencodable(self, text: &str) -> MarshalError {
        MarshalError::Unencodable {
            encoding: self,
            text: text.to_string(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ascii => "ascii",
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
        })
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Self::Latin1),
            other => Err(format!("unsupported text encoding '{other}'")),
        }
    }
}

/// Fixed-capacity output buffer handed to a native function.
///
/// Zero-filled on creation so a function that writes nothing yields an empty
/// string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutBuffer {
    bytes: Vec<u8>,
}

impl OutBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity],
        }
    }

    /// Buffer pre-filled with an encoded string (for in/out arguments).
    pub fn with_text(capacity: usize, encoding: TextEncoding, text: &str) -> MarshalResult<Self> {
        let encoded = encoding.encode(text)?;
        if encoded.len() >= capacity {
            return Err(MarshalError::out_of_range(
                format!("{} bytes", encoded.len() + 1),
                "fixed text buffer",
            ));
        }
        let mut buffer = Self::new(capacity);
        buffer.bytes[..encoded.len()].copy_from_slice(&encoded);
        Ok(buffer)
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_mut_ptr(&mut self) -> *mut c_char {
        self.bytes.as_mut_ptr().cast()
    }

    pub fn as_mut_bytes(&mut self) -> *mut u8 {
        self.bytes.as_mut_ptr()
    }

    /// Capacity converted to the native length argument type.
    pub fn len_arg<T: TryFrom<usize>>(&self) -> MarshalResult<T> {
        T::try_from(self.bytes.len()).map_err(|_| MarshalError::CapacityOverflow(self.bytes.len()))
    }

    /// Content up to the first NUL.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.bytes.iter().position(|&b| b == 0).unwrap_or(self.bytes.len());
        &self.bytes[..end]
    }

    /// Whole buffer including bytes after the terminator.
    pub fn raw(&self) -> &[u8] {
        &self.bytes
    }

    pub fn decode(&self, encoding: TextEncoding) -> MarshalResult<String> {
        encoding.decode(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_stops_at_nul() {
        let text = TextEncoding::Utf8.decode(b"1.2.3\0garbage").unwrap();
        assert_eq!(text, "1.2.3");
        assert_eq!(TextEncoding::Ascii.decode(b"no terminator").unwrap(), "no terminator");
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        assert!(matches!(
            TextEncoding::Ascii.encode("µs"),
            Err(MarshalError::Unencodable { .. })
        ));
        assert!(matches!(
            TextEncoding::Ascii.decode(&[0xb5, 0x73]),
            Err(MarshalError::Undecodable { encoding: TextEncoding::Ascii })
        ));
    }

    #[test]
    fn test_latin1_maps_bytes_to_chars() {
        assert_eq!(TextEncoding::Latin1.encode("µs").unwrap(), vec![0xb5, b's']);
        assert_eq!(TextEncoding::Latin1.decode(&[0xb5, b's', 0]).unwrap(), "µs");
        assert!(TextEncoding::Latin1.encode("€").is_err());
    }

    #[test]
    fn test_interior_nul_rejected() {
        let err = TextEncoding::Utf8.to_c_string("com_port", "COM\u{0}3").unwrap_err();
        assert_eq!(err, MarshalError::InteriorNul { name: "com_port".into() });
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("UTF-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("ascii".parse::<TextEncoding>().unwrap(), TextEncoding::Ascii);
        assert_eq!("iso-8859-1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert!("cp1252".parse::<TextEncoding>().is_err());
    }

    #[test]
    fn test_out_buffer() {
        let mut buffer = OutBuffer::with_text(12, TextEncoding::Ascii, "1234").unwrap();
        assert_eq!(buffer.capacity(), 12);
        assert_eq!(buffer.as_bytes(), b"1234");
        assert_eq!(buffer.len_arg::<i32>().unwrap(), 12);
        assert!(!buffer.as_mut_ptr().is_null());
        assert!(OutBuffer::with_text(4, TextEncoding::Ascii, "1234").is_err());
        assert_eq!(OutBuffer::new(8).decode(TextEncoding::Utf8).unwrap(), "");
        assert!(OutBuffer::new(300).len_arg::<u8>().is_err());
    }
}
