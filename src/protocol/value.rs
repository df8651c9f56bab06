//! Logical request/response values dan schema per kind.
//!
//! Schema (semua integer unsigned, harga f64):
//!
//! | Kind | Request body                         | Response body (setelah status)            |
//! |------|--------------------------------------|-------------------------------------------|
//! | 1    | -                                    | -                                         |
//! | 2    | source text, destination text        | identifiers list<u32>                     |
//! | 3    | flight_id u32                        | departure u64, airfare f64, seats u32     |
//! | 4    | flight_id u32, seats u32             | -                                         |
//! | 5    | flight_id u32, interval_secs u64     | - (subscription acknowledged)             |
//! | 6    | flight_id u32, new_price f64         | flight_id, source, destination, departure, airfare, seats |
//! | 7    | source, destination, departure, airfare, seats | flight_id u32                   |
//! | 201  | -                                    | seats u32 (push)                          |
//!
//! Identifier dan count selalu `u32`, durasi/timestamp `u64` detik. Hanya
//! harga yang floating point.

use super::kind::{RequestKind, ResponseKind, StatusCode};
use super::marshal::{Decoder, Encoder};
use crate::error::{Error, Result};

/// Record lengkap untuk membuat flight baru
#[derive(Debug, Clone, PartialEq)]
pub struct NewFlight {
    pub source: String,
    pub destination: String,
    /// Unix timestamp, detik
    pub departure_time: u64,
    pub airfare: f64,
    pub available_seats: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightInformation {
    pub departure_time: u64,
    pub airfare: f64,
    pub available_seats: u32,
}

/// Flight setelah harga di-update
#[derive(Debug, Clone, PartialEq)]
pub struct FlightRecord {
    pub flight_id: u32,
    pub source: String,
    pub destination: String,
    pub departure_time: u64,
    pub airfare: f64,
    pub available_seats: u32,
}

/// Logical request yang dibangun caller
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Ping,
    GetFlightIdentifiers { source: String, destination: String },
    GetFlightInformation { flight_id: u32 },
    MakeSeatReservation { flight_id: u32, seats: u32 },
    MonitorSeatUpdates { flight_id: u32, interval_secs: u64 },
    UpdateFlightPrice { flight_id: u32, new_price: f64 },
    CreateFlight(NewFlight),
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Ping => RequestKind::Ping,
            Self::GetFlightIdentifiers { .. } => RequestKind::GetFlightIdentifiers,
            Self::GetFlightInformation { .. } => RequestKind::GetFlightInformation,
            Self::MakeSeatReservation { .. } => RequestKind::MakeSeatReservation,
            Self::MonitorSeatUpdates { .. } => RequestKind::MonitorSeatUpdates,
            Self::UpdateFlightPrice { .. } => RequestKind::UpdateFlightPrice,
            Self::CreateFlight(_) => RequestKind::CreateFlight,
        }
    }

    /// Encode body sesuai schema kind (tanpa header)
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        match self {
            Self::Ping => {}
            Self::GetFlightIdentifiers {
                source,
                destination,
            } => {
                enc.put_text(source)?;
                enc.put_text(destination)?;
            }
            Self::GetFlightInformation { flight_id } => enc.put_u32(*flight_id),
            Self::MakeSeatReservation { flight_id, seats } => {
                enc.put_u32(*flight_id);
                enc.put_u32(*seats);
            }
            Self::MonitorSeatUpdates {
                flight_id,
                interval_secs,
            } => {
                enc.put_u32(*flight_id);
                enc.put_u64(*interval_secs);
            }
            Self::UpdateFlightPrice {
                flight_id,
                new_price,
            } => {
                enc.put_u32(*flight_id);
                enc.put_f64(*new_price)?;
            }
            Self::CreateFlight(flight) => {
                enc.put_text(&flight.source)?;
                enc.put_text(&flight.destination)?;
                enc.put_u64(flight.departure_time);
                enc.put_f64(flight.airfare)?;
                enc.put_u32(flight.available_seats);
            }
        }
        Ok(enc.into_bytes())
    }

    /// Decode body request (sisi peer). Padding di belakang diabaikan.
    pub fn decode(kind: RequestKind, payload: &[u8]) -> Result<Self> {
        let mut dec = Decoder::new(payload);
        let request = match kind {
            RequestKind::Ping => Self::Ping,
            RequestKind::GetFlightIdentifiers => Self::GetFlightIdentifiers {
                source: dec.text()?,
                destination: dec.text()?,
            },
            RequestKind::GetFlightInformation => Self::GetFlightInformation {
                flight_id: dec.u32()?,
            },
            RequestKind::MakeSeatReservation => Self::MakeSeatReservation {
                flight_id: dec.u32()?,
                seats: dec.u32()?,
            },
            RequestKind::MonitorSeatUpdates => Self::MonitorSeatUpdates {
                flight_id: dec.u32()?,
                interval_secs: dec.u64()?,
            },
            RequestKind::UpdateFlightPrice => Self::UpdateFlightPrice {
                flight_id: dec.u32()?,
                new_price: dec.f64()?,
            },
            RequestKind::CreateFlight => Self::CreateFlight(NewFlight {
                source: dec.text()?,
                destination: dec.text()?,
                departure_time: dec.u64()?,
                airfare: dec.f64()?,
                available_seats: dec.u32()?,
            }),
        };
        Ok(request)
    }
}

/// Hasil decode yang sukses
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Pong,
    FlightIdentifiers(Vec<u32>),
    FlightInformation(FlightInformation),
    SeatsReserved,
    /// Peer menerima subscription, push akan menyusul
    MonitorSubscribed,
    PriceUpdated(FlightRecord),
    FlightCreated { flight_id: u32 },
    /// Push (201) selama monitor window
    SeatUpdate { available_seats: u32 },
    /// Monitor window berakhir; dibuat oleh engine, tidak pernah di wire
    MonitorClosed { updates: usize },
}

impl Response {
    /// Response kind di wire, `None` untuk nilai yang hanya lokal
    pub fn kind(&self) -> Option<ResponseKind> {
        let kind = match self {
            Self::Pong => ResponseKind::Ping,
            Self::FlightIdentifiers(_) => ResponseKind::GetFlightIdentifiers,
            Self::FlightInformation(_) => ResponseKind::GetFlightInformation,
            Self::SeatsReserved => ResponseKind::MakeSeatReservation,
            Self::MonitorSubscribed => ResponseKind::MonitorSeatUpdates,
            Self::PriceUpdated(_) => ResponseKind::UpdateFlightPrice,
            Self::FlightCreated { .. } => ResponseKind::CreateFlight,
            Self::SeatUpdate { .. } => ResponseKind::MonitorPush,
            Self::MonitorClosed { .. } => return None,
        };
        Some(kind)
    }

    /// Encode status `Success` + body (sisi peer)
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        enc.put_u8(StatusCode::Success as u8);
        match self {
            Self::Pong | Self::SeatsReserved | Self::MonitorSubscribed => {}
            Self::FlightIdentifiers(ids) => enc.put_u32_list(ids),
            Self::FlightInformation(info) => {
                enc.put_u64(info.departure_time);
                enc.put_f64(info.airfare)?;
                enc.put_u32(info.available_seats);
            }
            Self::PriceUpdated(flight) => {
                enc.put_u32(flight.flight_id);
                enc.put_text(&flight.source)?;
                enc.put_text(&flight.destination)?;
                enc.put_u64(flight.departure_time);
                enc.put_f64(flight.airfare)?;
                enc.put_u32(flight.available_seats);
            }
            Self::FlightCreated { flight_id } => enc.put_u32(*flight_id),
            Self::SeatUpdate { available_seats } => enc.put_u32(*available_seats),
            Self::MonitorClosed { .. } => {
                return Err(Error::InvalidPayloadValue(
                    "monitor close is local and has no wire encoding".to_string(),
                ))
            }
        }
        Ok(enc.into_bytes())
    }

    fn decode_body(kind: ResponseKind, dec: &mut Decoder<'_>) -> Result<Self> {
        let response = match kind {
            ResponseKind::Ping => Self::Pong,
            ResponseKind::GetFlightIdentifiers => Self::FlightIdentifiers(dec.u32_list()?),
            ResponseKind::GetFlightInformation => Self::FlightInformation(FlightInformation {
                departure_time: dec.u64()?,
                airfare: dec.f64()?,
                available_seats: dec.u32()?,
            }),
            ResponseKind::MakeSeatReservation => Self::SeatsReserved,
            ResponseKind::MonitorSeatUpdates => Self::MonitorSubscribed,
            ResponseKind::UpdateFlightPrice => Self::PriceUpdated(FlightRecord {
                flight_id: dec.u32()?,
                source: dec.text()?,
                destination: dec.text()?,
                departure_time: dec.u64()?,
                airfare: dec.f64()?,
                available_seats: dec.u32()?,
            }),
            ResponseKind::CreateFlight => Self::FlightCreated {
                flight_id: dec.u32()?,
            },
            ResponseKind::MonitorPush => Self::SeatUpdate {
                available_seats: dec.u32()?,
            },
        };
        Ok(response)
    }
}

/// Payload response setelah status byte dibaca
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Success(Response),
    /// Status 2..=6, body tidak diinterpretasi
    Failure(StatusCode),
}

impl Reply {
    /// Decode payload response: status byte dulu, lalu body per kind
    pub fn decode(kind: ResponseKind, payload: &[u8]) -> Result<Self> {
        let mut dec = Decoder::new(payload);
        let raw_status = dec.u8()?;

        match StatusCode::from_u8(raw_status) {
            Some(StatusCode::Success) => Ok(Self::Success(Response::decode_body(kind, &mut dec)?)),
            Some(code) => Ok(Self::Failure(code)),
            None => Err(Error::InvalidPayloadValue(format!(
                "unknown status byte {}",
                raw_status
            ))),
        }
    }

    /// Payload untuk status non-success (sisi peer)
    pub fn encode_failure(code: StatusCode) -> Vec<u8> {
        vec![code as u8]
    }

    pub fn into_result(self) -> Result<Response> {
        match self {
            Self::Success(response) => Ok(response),
            Self::Failure(code) => Err(Error::Business(code)),
        }
    }
}
