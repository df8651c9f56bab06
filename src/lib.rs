//! Iris - Flight Reservation Request Engine
//!
//! Arsitektur:
//! - Binary Protocol: header 26 byte, packet 512 byte, fragmentasi otomatis
//! - Single-threaded: satu mio event loop, tanpa lock
//! - At-least-once: retransmission dengan correlation id yang sama
//! - Deferred results: `issue` langsung kembali, hasil lewat `CallHandle`
//!
//! ```no_run
//! use iris::{EngineConfig, Request, RequestEngine};
//!
//! let mut engine = RequestEngine::connect("127.0.0.1:8080".parse()?, EngineConfig::default())?;
//! let ids = engine.call(Request::GetFlightIdentifiers {
//!     source: "SIN".to_string(),
//!     destination: "KUL".to_string(),
//! })?;
//! println!("{:?}", ids);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod core;
pub mod error;
pub mod network;
pub mod protocol;

pub use error::{Error, Result};
pub use network::{CallHandle, CallOptions, EngineConfig, RequestEngine};
pub use protocol::{
    CorrelationId, FlightInformation, FlightRecord, NewFlight, Request, RequestKind, Response,
    StatusCode,
};
