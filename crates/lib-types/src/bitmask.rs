//! Packed per-channel flag registers.
//!
//! Hardware registers pack one boolean per channel into a byte. The channel
//! order is most-significant bit first: index 0 of the expanded sequence is
//! bit 7 of the byte. Encoding requires exactly one flag per bit and fails
//! locally on a length mismatch so malformed data never reaches a device.

use crate::error::CodecError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of a channel-enable register.
pub const MASK_WIDTH: usize = 8;

/// Expand an 8-bit register into eight flags, MSB first.
pub fn decode_bitmask(byte: u8) -> [bool; MASK_WIDTH] {
    let mut bits = [false; MASK_WIDTH];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = byte & (0x80 >> i) != 0;
    }
    bits
}

/// Pack exactly eight flags, MSB first, into a register byte.
pub fn encode_bitmask(bits: &[bool]) -> Result<u8, CodecError> {
    if bits.len() != MASK_WIDTH {
        return Err(CodecError::invalid_length(MASK_WIDTH, bits.len()));
    }
    Ok(bits
        .iter()
        .fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit)))
}

/// Expand the low `width` bits of `value` into flags, MSB first.
pub fn decode_bits(value: u32, width: usize) -> Result<Vec<bool>, CodecError> {
    check_width(width)?;
    if width < 32 && value >> width != 0 {
        return Err(CodecError::ValueTooWide { value, width });
    }
    Ok((0..width)
        .map(|i| value & (1u32 << (width - 1 - i)) != 0)
        .collect())
}

/// Pack `width` flags, MSB first.
pub fn encode_bits(bits: &[bool], width: usize) -> Result<u32, CodecError> {
    check_width(width)?;
    if bits.len() != width {
        return Err(CodecError::invalid_length(width, bits.len()));
    }
    Ok(bits
        .iter()
        .fold(0u32, |acc, &bit| (acc << 1) | u32::from(bit)))
}

fn check_width(width: usize) -> Result<(), CodecError> {
    if width == 0 || width > 32 {
        return Err(CodecError::InvalidWidth(width));
    }
    Ok(())
}

/// An 8-bit channel-enable register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitMask8(pub u8);

impl BitMask8 {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0xff);

    /// Pack eight flags (channel 0 first) into a register.
    pub fn from_channels(bits: &[bool]) -> Result<Self, CodecError> {
        encode_bitmask(bits).map(Self)
    }

    /// Expand into eight flags, channel 0 first.
    pub fn channels(self) -> [bool; MASK_WIDTH] {
        decode_bitmask(self.0)
    }

    /// Flag for a single channel; `None` past the last channel.
    pub fn channel(self, index: usize) -> Option<bool> {
        (index < MASK_WIDTH).then(|| self.0 & (0x80 >> index) != 0)
    }

    /// Return a copy with one channel changed.
    pub fn with_channel(self, index: usize, enabled: bool) -> Result<Self, CodecError> {
        if index >= MASK_WIDTH {
            return Err(CodecError::invalid_length(MASK_WIDTH, index + 1));
        }
        let bit = 0x80u8 >> index;
        Ok(if enabled {
            Self(self.0 | bit)
        } else {
            Self(self.0 & !bit)
        })
    }

    /// Indices of the enabled channels.
    pub fn enabled(self) -> impl Iterator<Item = usize> {
        self.channels()
            .into_iter()
            .enumerate()
            .filter_map(|(i, on)| on.then_some(i))
    }
}

impl From<u8> for BitMask8 {
    fn from(byte: u8) -> Self {
        Self(byte)
    }
}

impl From<BitMask8> for u8 {
    fn from(mask: BitMask8) -> Self {
        mask.0
    }
}

impl fmt::Display for BitMask8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08b}", self.0)
    }
}
