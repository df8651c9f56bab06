//! Error types untuk iris.
//!
//! Satu enum untuk semua jalur kegagalan. Hanya "tidak ada balasan" yang
//! ditangani lokal (retry); sisanya diserahkan ke caller tepat satu kali.

use thiserror::Error;

use crate::protocol::StatusCode;

/// Main error type for all engine, codec and marshaller operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Send/bind/poll failure pada socket. Fatal untuk call, tidak di-retry.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Datagram lebih pendek dari header 26 byte.
    #[error("truncated header: got {len} bytes")]
    TruncatedHeader { len: usize },

    /// Field header tidak valid (correlation id, kind, posisi fragment).
    #[error("invalid header field: {0}")]
    InvalidHeaderField(String),

    /// Nilai tidak bisa di-encode/decode di bawah schema kind yang aktif.
    #[error("invalid payload value: {0}")]
    InvalidPayloadValue(String),

    /// Payload berakhir sebelum schema selesai dibaca.
    #[error("truncated payload: needed {needed} bytes, {available} available")]
    TruncatedPayload { needed: usize, available: usize },

    /// Semua percobaan habis tanpa balasan.
    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// Peer melaporkan kegagalan business logic.
    #[error("peer reported {0}")]
    Business(StatusCode),

    /// Engine di-shutdown sebelum call selesai.
    #[error("call cancelled by engine shutdown")]
    Cancelled,
}

impl Error {
    /// Status code dari peer, jika ini business error.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Error::Business(code) => Some(*code),
            _ => None,
        }
    }
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
