// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire primitives: network-order doubles, a bounds-checked reader and an
//! exact-size writer that fills a pre-sized region in place.

use crate::error::DecodeError;
use crate::math::Mat4;
use crate::width::{self, WidthCode};

/// Bytes per wire double.
pub const F64_WIRE_LEN: usize = 8;

/// Bytes per wire matrix (16 doubles, row-major, no padding).
pub const MAT4_WIRE_LEN: usize = 16 * F64_WIRE_LEN;

/// Converts a double to its IEEE-754 big-endian wire form.
#[inline]
pub fn f64_to_wire(value: f64) -> [u8; F64_WIRE_LEN] {
    value.to_be_bytes()
}

/// Converts a big-endian wire double back to `f64`.
#[inline]
pub fn wire_to_f64(bytes: [u8; F64_WIRE_LEN]) -> f64 {
    f64::from_be_bytes(bytes)
}

/// Sequential reader over one region of a record.
///
/// Offsets reported in errors are absolute: `base` is the region's position
/// inside the whole record.
#[derive(Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    base: usize,
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over a whole record.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_base(bytes, 0)
    }

    /// Create a reader over a region starting at `base` within the record.
    pub fn with_base(bytes: &'a [u8], base: usize) -> Self {
        Self {
            bytes,
            base,
            offset: 0,
        }
    }

    /// Absolute offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.base + self.offset
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Consume exactly `len` bytes.
    pub fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], DecodeError> {
        let truncated = || DecodeError::Truncated {
            what,
            offset: self.position(),
            needed: len,
            available: self.remaining(),
        };
        let end = self.offset.checked_add(len).ok_or_else(truncated)?;
        let out = self.bytes.get(self.offset..end).ok_or_else(truncated)?;
        self.offset = end;
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self, what: &'static str) -> Result<u8, DecodeError> {
        Ok(self.take(1, what)?[0])
    }

    /// Read an unsigned width-coded integer.
    pub fn read_unsigned(
        &mut self,
        width: WidthCode,
        what: &'static str,
    ) -> Result<u64, DecodeError> {
        let chunk = self.take(width.byte_len(), what)?;
        let (value, _) = width::decode_unsigned(chunk, width).ok_or(DecodeError::Truncated {
            what,
            offset: self.position(),
            needed: width.byte_len(),
            available: chunk.len(),
        })?;
        Ok(value)
    }

    /// Read a signed width-coded integer.
    pub fn read_signed(&mut self, width: WidthCode, what: &'static str) -> Result<i64, DecodeError> {
        let chunk = self.take(width.byte_len(), what)?;
        let (value, _) = width::decode_signed(chunk, width).ok_or(DecodeError::Truncated {
            what,
            offset: self.position(),
            needed: width.byte_len(),
            available: chunk.len(),
        })?;
        Ok(value)
    }

    /// Read one wire matrix.
    pub fn read_mat4(&mut self) -> Result<Mat4, DecodeError> {
        let chunk = self.take(MAT4_WIRE_LEN, "matrix")?;
        let mut data = [0.0; 16];
        for (slot, raw) in data.iter_mut().zip(chunk.chunks_exact(F64_WIRE_LEN)) {
            let mut bytes = [0u8; F64_WIRE_LEN];
            bytes.copy_from_slice(raw);
            *slot = wire_to_f64(bytes);
        }
        Ok(Mat4::new(data))
    }

    /// Read a NUL-terminated UTF-8 string, consuming the terminator.
    pub fn read_cstr(&mut self) -> Result<&'a str, DecodeError> {
        let start = self.position();
        let rest = &self.bytes[self.offset..];
        let nul = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or(DecodeError::UnterminatedName { offset: start })?;
        let raw = self.take(nul + 1, "leaf name")?;
        core::str::from_utf8(&raw[..nul]).map_err(|_| DecodeError::InvalidName { offset: start })
    }
}

/// Writer that fills a pre-sized region exactly.
///
/// The region length comes from the counting pass; writing past it means the
/// counting and writing passes disagree, which is a bug and panics.
#[derive(Debug)]
pub struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
    region: &'static str,
}

impl<'a> SliceWriter<'a> {
    /// Wrap a region of the output buffer.
    pub fn new(buf: &'a mut [u8], region: &'static str) -> Self {
        Self {
            buf,
            pos: 0,
            region,
        }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Region size.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// True once the region is completely filled.
    pub fn is_full(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn room(&mut self) -> &mut [u8] {
        &mut self.buf[self.pos..]
    }

    /// Write raw bytes.
    ///
    /// # Panics
    ///
    /// Panics if the bytes do not fit the region.
    pub fn put(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        assert!(
            end <= self.buf.len(),
            "{} region overrun: {} + {} > {}",
            self.region,
            self.pos,
            bytes.len(),
            self.buf.len()
        );
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    /// Write a single byte.
    pub fn put_u8(&mut self, value: u8) {
        self.put(&[value]);
    }

    /// Write an unsigned width-coded integer.
    ///
    /// # Panics
    ///
    /// Panics if the value does not fit the width or the region.
    pub fn put_unsigned(&mut self, value: u64, width: WidthCode) {
        let region = self.region;
        let n = width::encode_unsigned(self.room(), value, width);
        assert!(n.is_some(), "{region}: cannot write {value} at {width}");
        self.pos += width.byte_len();
    }

    /// Write a signed width-coded integer.
    ///
    /// # Panics
    ///
    /// Panics if the value does not fit the width or the region.
    pub fn put_signed(&mut self, value: i64, width: WidthCode) {
        let region = self.region;
        let n = width::encode_signed(self.room(), value, width);
        assert!(n.is_some(), "{region}: cannot write {value} at {width}");
        self.pos += width.byte_len();
    }

    /// Write one matrix as 16 wire doubles.
    pub fn put_mat4(&mut self, matrix: &Mat4) {
        for value in matrix.as_array() {
            self.put(&f64_to_wire(*value));
        }
    }
}
