//! Protocol Layer: Fixed Header + Schema-Implied Binary Encoding
//!
//! Prinsip desain:
//! - Fixed-size header: 26 byte, little-endian, packet selalu 512 byte
//! - Tanpa type tag: schema payload ditentukan oleh request/response kind
//! - Status byte di depan setiap response payload

mod fragment;
mod header;
mod kind;
mod marshal;
mod value;

pub use fragment::{packetize, Reassembly};
pub use header::{
    CorrelationId, Header, CORRELATION_ID_LEN, HEADER_SIZE, MAX_FRAGMENT_PAYLOAD, PACKET_SIZE,
};
pub use kind::{RequestKind, ResponseKind, StatusCode};
pub use marshal::{Decoder, Encoder};
pub use value::{FlightInformation, FlightRecord, NewFlight, Reply, Request, Response};
