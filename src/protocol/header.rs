//! Fixed-Layout Packet Header
//!
//! Layout (little-endian, 26 bytes):
//! ┌────────┬──────────────────┬────────────────┬────────────────┐
//! │ kind   │ correlation id   │ fragment index │ fragment total │
//! │ u8     │ 9 ASCII bytes    │ u64 (1-based)  │ u64            │
//! └────────┴──────────────────┴────────────────┴────────────────┘
//!   0        1..9               10..17           18..25
//!
//! Setiap datagram = header + payload, total 512 byte.

use std::fmt;

use crate::error::{Error, Result};

pub const HEADER_SIZE: usize = 26;
pub const PACKET_SIZE: usize = 512;
/// Payload maksimum per fragment
pub const MAX_FRAGMENT_PAYLOAD: usize = PACKET_SIZE - HEADER_SIZE;
pub const CORRELATION_ID_LEN: usize = 9;

const KIND_OFFSET: usize = 0;
const ID_OFFSET: usize = 1;
const INDEX_OFFSET: usize = ID_OFFSET + CORRELATION_ID_LEN;
const TOTAL_OFFSET: usize = INDEX_OFFSET + 8;

/// Identifier 9 byte ASCII yang stabil untuk satu logical call,
/// di semua retransmission dan fragment-nya.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId([u8; CORRELATION_ID_LEN]);

impl CorrelationId {
    /// Validasi dan bungkus 9 byte printable ASCII (0x21..=0x7E)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != CORRELATION_ID_LEN {
            return Err(Error::InvalidHeaderField(format!(
                "correlation id must be {} bytes, got {}",
                CORRELATION_ID_LEN,
                bytes.len()
            )));
        }
        if let Some(b) = bytes.iter().find(|b| !b.is_ascii_graphic()) {
            return Err(Error::InvalidHeaderField(format!(
                "correlation id contains non-printable byte 0x{:02x}",
                b
            )));
        }
        let mut id = [0u8; CORRELATION_ID_LEN];
        id.copy_from_slice(bytes);
        Ok(Self(id))
    }

    /// Byte dari generator internal, selalu alphanumeric
    pub(crate) fn from_alphanumeric(raw: [u8; CORRELATION_ID_LEN]) -> Self {
        debug_assert!(raw.iter().all(u8::is_ascii_alphanumeric));
        Self(raw)
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8; CORRELATION_ID_LEN] {
        &self.0
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        // Selalu ASCII, dijamin oleh from_bytes
        std::str::from_utf8(&self.0).unwrap_or("?????????")
    }
}

impl std::str::FromStr for CorrelationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_bytes(s.as_bytes())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CorrelationId({})", self.as_str())
    }
}

/// Header hasil parse dari datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Request kind (1..=7) atau response kind (101..=107, 201)
    pub kind: u8,
    pub correlation_id: CorrelationId,
    /// Posisi fragment, mulai dari 1
    pub fragment_index: u64,
    pub fragment_total: u64,
}

impl Header {
    /// Header untuk single-fragment packet
    pub fn single(kind: u8, correlation_id: CorrelationId) -> Self {
        Self {
            kind,
            correlation_id,
            fragment_index: 1,
            fragment_total: 1,
        }
    }

    /// Build header 26 byte dari field mentah.
    ///
    /// `kind` bertipe `u8`, jadi "tidak muat satu byte" sudah ditolak oleh
    /// compiler. Correlation id harus tepat 9 karakter printable ASCII.
    pub fn construct(
        kind: u8,
        correlation_id: &str,
        fragment_index: u64,
        fragment_total: u64,
    ) -> Result<[u8; HEADER_SIZE]> {
        let correlation_id = correlation_id.parse::<CorrelationId>()?;
        Header {
            kind,
            correlation_id,
            fragment_index,
            fragment_total,
        }
        .to_bytes()
    }

    /// Parse header dari awal buffer. Byte setelah offset 26 diabaikan.
    pub fn deconstruct(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::TruncatedHeader { len: buf.len() });
        }

        let header = Self {
            kind: buf[KIND_OFFSET],
            correlation_id: CorrelationId::from_bytes(&buf[ID_OFFSET..INDEX_OFFSET])?,
            fragment_index: read_u64(&buf[INDEX_OFFSET..TOTAL_OFFSET]),
            fragment_total: read_u64(&buf[TOTAL_OFFSET..HEADER_SIZE]),
        };
        header.validate_position()?;
        Ok(header)
    }

    /// Serialize ke 26 byte (little-endian)
    pub fn to_bytes(&self) -> Result<[u8; HEADER_SIZE]> {
        self.validate_position()?;

        let mut buf = [0u8; HEADER_SIZE];
        buf[KIND_OFFSET] = self.kind;
        buf[ID_OFFSET..INDEX_OFFSET].copy_from_slice(self.correlation_id.as_bytes());
        buf[INDEX_OFFSET..TOTAL_OFFSET].copy_from_slice(&self.fragment_index.to_le_bytes());
        buf[TOTAL_OFFSET..HEADER_SIZE].copy_from_slice(&self.fragment_total.to_le_bytes());
        Ok(buf)
    }

    #[inline(always)]
    pub fn is_single_fragment(&self) -> bool {
        self.fragment_total == 1
    }

    fn validate_position(&self) -> Result<()> {
        if self.fragment_index == 0 || self.fragment_index > self.fragment_total {
            return Err(Error::InvalidHeaderField(format!(
                "fragment index {} out of range 1..={}",
                self.fragment_index, self.fragment_total
            )));
        }
        Ok(())
    }
}

#[inline(always)]
fn read_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(HEADER_SIZE, 26);
        assert_eq!(MAX_FRAGMENT_PAYLOAD, 486);
    }

    #[test]
    fn test_header_roundtrip() {
        let bytes = Header::construct(2, "abcDEF123", 1, 3).unwrap();
        let header = Header::deconstruct(&bytes).unwrap();

        assert_eq!(header.kind, 2);
        assert_eq!(header.correlation_id.as_str(), "abcDEF123");
        assert_eq!(header.fragment_index, 1);
        assert_eq!(header.fragment_total, 3);
    }

    #[test]
    fn test_wire_layout() {
        let bytes = Header::construct(107, "fgTdljD0M", 2, 5).unwrap();

        assert_eq!(bytes[0], 107);
        assert_eq!(&bytes[1..10], b"fgTdljD0M");
        assert_eq!(&bytes[10..18], &[2, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[18..26], &[5, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_invalid_correlation_id() {
        assert!(matches!(
            Header::construct(1, "short", 1, 1),
            Err(Error::InvalidHeaderField(_))
        ));
        assert!(matches!(
            Header::construct(1, "has space", 1, 1),
            Err(Error::InvalidHeaderField(_))
        ));
        assert!(matches!(
            Header::construct(1, "ünïcødé!", 1, 1),
            Err(Error::InvalidHeaderField(_))
        ));
    }

    #[test]
    fn test_invalid_fragment_position() {
        assert!(Header::construct(1, "abcdefghi", 0, 1).is_err());
        assert!(Header::construct(1, "abcdefghi", 3, 2).is_err());
    }

    #[test]
    fn test_truncated() {
        let bytes = Header::construct(1, "abcdefghi", 1, 1).unwrap();
        match Header::deconstruct(&bytes[..25]) {
            Err(Error::TruncatedHeader { len }) => assert_eq!(len, 25),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_trailing_payload_ignored() {
        let mut packet = vec![0u8; PACKET_SIZE];
        packet[..HEADER_SIZE].copy_from_slice(&Header::construct(103, "zzzzzzzz1", 1, 1).unwrap());
        packet[HEADER_SIZE] = 1;

        let header = Header::deconstruct(&packet).unwrap();
        assert_eq!(header.kind, 103);
        assert!(header.is_single_fragment());
    }
}
