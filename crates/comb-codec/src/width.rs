// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Width-coded integers.
//!
//! Every variable-length integer in a record uses the same byte width,
//! selected once per record and stored in the record's first byte. Values
//! are big-endian; signed values are two's complement at that width and are
//! sign-extended on decode.

/// Byte width shared by every varint in one record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WidthCode {
    /// One byte.
    W8 = 0,
    /// Two bytes.
    W16 = 1,
    /// Four bytes.
    W32 = 2,
    /// Eight bytes.
    W64 = 3,
}

impl WidthCode {
    /// All width codes, narrowest first.
    pub const ALL: [Self; 4] = [Self::W8, Self::W16, Self::W32, Self::W64];

    /// Parses the on-disk code byte.
    pub const fn from_byte(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::W8),
            1 => Some(Self::W16),
            2 => Some(Self::W32),
            3 => Some(Self::W64),
            _ => None,
        }
    }

    /// The on-disk code byte.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Number of bytes one integer occupies at this width.
    pub const fn byte_len(self) -> usize {
        match self {
            Self::W8 => 1,
            Self::W16 => 2,
            Self::W32 => 4,
            Self::W64 => 8,
        }
    }

    /// Narrowest width able to hold `max` as an unsigned value.
    ///
    /// The 32-bit band stops short of `0x7fff_fffe` so that readers treating
    /// the value as a signed 32-bit quantity never see a negative length.
    pub const fn select(max: u64) -> Self {
        if max <= 0xff {
            Self::W8
        } else if max <= 0xffff {
            Self::W16
        } else if max < 0x7fff_fffe {
            Self::W32
        } else {
            Self::W64
        }
    }

    /// Largest unsigned value representable at this width.
    pub const fn max_unsigned(self) -> u64 {
        match self {
            Self::W8 => u8::MAX as u64,
            Self::W16 => u16::MAX as u64,
            Self::W32 => u32::MAX as u64,
            Self::W64 => u64::MAX,
        }
    }
}

impl core::fmt::Display for WidthCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-bit", self.byte_len() * 8)
    }
}

/// Writes `value` at `width` into the front of `out`, returning the bytes written.
///
/// Returns `None` when `out` is too short or `value` does not fit the width.
pub fn encode_unsigned(out: &mut [u8], value: u64, width: WidthCode) -> Option<usize> {
    let len = width.byte_len();
    if value > width.max_unsigned() {
        return None;
    }
    let dst = out.get_mut(..len)?;
    dst.copy_from_slice(&value.to_be_bytes()[8 - len..]);
    Some(len)
}

/// Writes the two's complement of `value` at `width`, returning the bytes written.
///
/// Returns `None` when `out` is too short or `value` is outside the signed
/// range of the width.
pub fn encode_signed(out: &mut [u8], value: i64, width: WidthCode) -> Option<usize> {
    let len = width.byte_len();
    let bits = len * 8;
    if bits < 64 {
        let limit = 1i64 << (bits - 1);
        if value < -limit || value >= limit {
            return None;
        }
    }
    let dst = out.get_mut(..len)?;
    dst.copy_from_slice(&value.to_be_bytes()[8 - len..]);
    Some(len)
}

/// Reads an unsigned value at `width` from the front of `input`.
///
/// Returns `(value, bytes_read)`, or `None` when `input` is too short.
pub fn decode_unsigned(input: &[u8], width: WidthCode) -> Option<(u64, usize)> {
    let len = width.byte_len();
    let src = input.get(..len)?;
    let mut raw = [0u8; 8];
    raw[8 - len..].copy_from_slice(src);
    Some((u64::from_be_bytes(raw), len))
}

/// Reads a sign-extended value at `width` from the front of `input`.
pub fn decode_signed(input: &[u8], width: WidthCode) -> Option<(i64, usize)> {
    let len = width.byte_len();
    let src = input.get(..len)?;
    let fill = if src.first().is_some_and(|b| b & 0x80 != 0) {
        0xff
    } else {
        0x00
    };
    let mut raw = [fill; 8];
    raw[8 - len..].copy_from_slice(src);
    Some((i64::from_be_bytes(raw), len))
}
