//! Network Layer: UDP request engine
//!
//! Menggunakan mio untuk non-blocking I/O di atas satu socket UDP.
//!
//! Fitur:
//! - Multiplexing banyak call via correlation id
//! - Retransmission per call dengan timer sendiri
//! - Monitor subscription dengan push selama window
//!
//! Note: untuk CLI, lihat src/bin/flight_client.rs

mod config;
mod engine;
mod handle;
mod registry;
mod socket;

pub use config::{CallOptions, EngineConfig, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_INTERVAL};
pub use engine::RequestEngine;
pub use handle::CallHandle;
pub use registry::{CallState, PendingCall, PendingCallRegistry};
pub use socket::DatagramSocket;
