//! Konfigurasi engine dan opsi per call.

use std::time::Duration;

use crate::protocol::CorrelationId;

/// Default retransmission interval
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(5000);
/// Default jumlah retransmission setelah pengiriman pertama
pub const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RECV_BUFFER_SIZE: usize = 256 * 1024; // 256KB
const DEFAULT_EVENTS_CAPACITY: usize = 128;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Jeda antara pengiriman dan retransmission berikutnya
    pub retry_interval: Duration,
    /// Retransmission maksimum sebelum `RetriesExhausted`
    pub max_retries: u32,
    /// SO_RCVBUF untuk socket (unix)
    pub recv_buffer_size: usize,
    /// Kapasitas `mio::Events` per poll
    pub events_capacity: usize,
    /// Seed generator correlation id; `None` = dari entropy OS
    pub id_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry_interval: DEFAULT_RETRY_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            events_capacity: DEFAULT_EVENTS_CAPACITY,
            id_seed: None,
        }
    }
}

impl EngineConfig {
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    pub fn id_seed(mut self, seed: u64) -> Self {
        self.id_seed = Some(seed);
        self
    }
}

/// Opsi untuk satu call
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Pakai correlation id ini alih-alih generate baru
    pub correlation_id: Option<CorrelationId>,
    /// Buang satu balasan valid pertama (simulasi response hilang)
    pub discard_first_reply: bool,
}

impl CallOptions {
    pub fn correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = Some(id);
        self
    }

    pub fn discard_first_reply(mut self) -> Self {
        self.discard_first_reply = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.retry_interval, Duration::from_millis(5000));
        assert_eq!(config.max_retries, 3);
        assert!(config.id_seed.is_none());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::default()
            .retry_interval(Duration::from_millis(50))
            .max_retries(1)
            .id_seed(9);
        assert_eq!(config.retry_interval, Duration::from_millis(50));
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.id_seed, Some(9));

        let options = CallOptions::default().discard_first_reply();
        assert!(options.discard_first_reply);
        assert!(options.correlation_id.is_none());
    }
}
