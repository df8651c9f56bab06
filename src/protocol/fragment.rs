//! Fragmentasi dan reassembly payload.
//!
//! Payload > 486 byte dipecah ke beberapa packet 512 byte dengan correlation
//! id yang sama. Sisi penerima menahan fragment per correlation id sampai
//! semua index `1..=fragment_total` ada, lalu melepas payload gabungan
//! tepat satu kali.

use std::collections::BTreeMap;

use super::header::{CorrelationId, Header, HEADER_SIZE, MAX_FRAGMENT_PAYLOAD, PACKET_SIZE};
use crate::error::{Error, Result};

/// Pecah payload ke packet 512 byte (header + payload, zero padded).
///
/// Payload kosong tetap menghasilkan satu packet.
pub fn packetize(kind: u8, correlation_id: CorrelationId, payload: &[u8]) -> Result<Vec<Vec<u8>>> {
    let chunks: Vec<&[u8]> = if payload.is_empty() {
        vec![payload]
    } else {
        payload.chunks(MAX_FRAGMENT_PAYLOAD).collect()
    };

    let total = chunks.len() as u64;
    let mut packets = Vec::with_capacity(chunks.len());

    for (i, chunk) in chunks.into_iter().enumerate() {
        let header = Header {
            kind,
            correlation_id,
            fragment_index: i as u64 + 1,
            fragment_total: total,
        };

        let mut packet = vec![0u8; PACKET_SIZE];
        packet[..HEADER_SIZE].copy_from_slice(&header.to_bytes()?);
        packet[HEADER_SIZE..HEADER_SIZE + chunk.len()].copy_from_slice(chunk);
        packets.push(packet);
    }

    Ok(packets)
}

/// Buffer fragment untuk satu correlation id
#[derive(Debug)]
pub struct Reassembly {
    kind: u8,
    total: u64,
    fragments: BTreeMap<u64, Vec<u8>>,
}

impl Reassembly {
    /// Buffer baru, dimensi diambil dari fragment pertama yang datang
    pub fn new(first: &Header) -> Self {
        Self {
            kind: first.kind,
            total: first.fragment_total,
            fragments: BTreeMap::new(),
        }
    }

    /// Simpan satu fragment.
    ///
    /// Returns payload gabungan (urut index) saat fragment terakhir masuk,
    /// `None` jika masih menunggu. Fragment duplikat diabaikan.
    pub fn push(&mut self, header: &Header, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        if header.fragment_total != self.total || header.kind != self.kind {
            return Err(Error::InvalidHeaderField(format!(
                "fragment {}/{} kind {} does not match pending set of {} kind {}",
                header.fragment_index, header.fragment_total, header.kind, self.total, self.kind
            )));
        }

        self.fragments
            .entry(header.fragment_index)
            .or_insert_with(|| payload.to_vec());

        if (self.fragments.len() as u64) < self.total {
            return Ok(None);
        }

        let fragments = std::mem::take(&mut self.fragments);
        let mut joined = Vec::with_capacity(fragments.values().map(Vec::len).sum());
        for part in fragments.into_values() {
            joined.extend_from_slice(&part);
        }
        Ok(Some(joined))
    }

    /// Jumlah fragment unik yang sudah diterima
    #[inline(always)]
    pub fn received(&self) -> usize {
        self.fragments.len()
    }
}
