//! Schema-Driven Binary Marshaller
//!
//! Primitive encoding (tanpa type tag di wire, schema ditentukan kind):
//! - text  : UTF-8 + satu byte 0x00
//! - u32   : 4 byte LE (identifier, count)
//! - u64   : 8 byte LE (durasi/timestamp, detik)
//! - f64   : 8 byte IEEE-754 LE (harga)
//! - list  : count u64 LE + elemen fixed-width berurutan
//!
//! Composite record = field berurutan. Text bersifat variable-length, jadi
//! decoder selalu melacak `read_pos` berjalan, bukan index field tetap.

use crate::error::{Error, Result};

const TEXT_TERMINATOR: u8 = 0x00;

/// Growable encoder buffer
pub struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    #[inline(always)]
    pub fn put_u8(&mut self, v: u8) {
        self.buffer.push(v);
    }

    #[inline(always)]
    pub fn put_u32(&mut self, v: u32) {
        self.buffer.extend_from_slice(&v.to_le_bytes());
    }

    #[inline(always)]
    pub fn put_u64(&mut self, v: u64) {
        self.buffer.extend_from_slice(&v.to_le_bytes());
    }

    /// Harga harus finite; NaN/inf ditolak sebelum encode
    #[inline]
    pub fn put_f64(&mut self, v: f64) -> Result<()> {
        if !v.is_finite() {
            return Err(Error::InvalidPayloadValue(format!(
                "price must be finite, got {}",
                v
            )));
        }
        self.buffer.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    /// Text dengan terminator 0x00. Embedded NUL ditolak.
    #[inline]
    pub fn put_text(&mut self, v: &str) -> Result<()> {
        if v.as_bytes().contains(&TEXT_TERMINATOR) {
            return Err(Error::InvalidPayloadValue(format!(
                "text {:?} contains an embedded NUL byte",
                v
            )));
        }
        self.buffer.extend_from_slice(v.as_bytes());
        self.buffer.push(TEXT_TERMINATOR);
        Ok(())
    }

    /// List of u32: count u64 LE, lalu elemen
    #[inline]
    pub fn put_u32_list(&mut self, values: &[u32]) {
        self.put_u64(values.len() as u64);
        for v in values {
            self.put_u32(*v);
        }
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Zero-copy cursor decoder
pub struct Decoder<'a> {
    buffer: &'a [u8],
    read_pos: usize,
}

impl<'a> Decoder<'a> {
    #[inline(always)]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            read_pos: 0,
        }
    }

    /// Ambil `n` byte berikutnya
    #[inline]
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if n > available {
            return Err(Error::TruncatedPayload {
                needed: n,
                available,
            });
        }
        let start = self.read_pos;
        self.read_pos += n;
        Ok(&self.buffer[start..self.read_pos])
    }

    #[inline]
    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut raw = [0u8; N];
        raw.copy_from_slice(self.take(N)?);
        Ok(raw)
    }

    #[inline]
    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    pub fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    #[inline]
    pub fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    #[inline]
    pub fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    /// Baca sampai terminator 0x00 pertama
    pub fn text(&mut self) -> Result<String> {
        let rest = &self.buffer[self.read_pos..];
        let end = rest
            .iter()
            .position(|&b| b == TEXT_TERMINATOR)
            .ok_or(Error::TruncatedPayload {
                needed: rest.len() + 1,
                available: rest.len(),
            })?;

        let text = std::str::from_utf8(&rest[..end])
            .map_err(|e| Error::InvalidPayloadValue(format!("text is not UTF-8: {}", e)))?
            .to_owned();
        self.read_pos += end + 1;
        Ok(text)
    }

    pub fn u32_list(&mut self) -> Result<Vec<u32>> {
        let count = self.u64()?;
        let available = self.remaining();
        let needed = usize::try_from(count)
            .ok()
            .and_then(|c| c.checked_mul(4))
            .ok_or(Error::TruncatedPayload {
                needed: usize::MAX,
                available,
            })?;
        if needed > available {
            return Err(Error::TruncatedPayload { needed, available });
        }

        let mut values = Vec::with_capacity(needed / 4);
        for _ in 0..count {
            values.push(self.u32()?);
        }
        Ok(values)
    }

    /// Remaining bytes
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.read_pos)
    }
}
