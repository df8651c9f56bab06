//! Tipe pesan dan status code dalam protokol flight information.
//!
//! Range:
//! - 1..=7     : request
//! - 101..=107 : response (request + 100)
//! - 201       : monitor push (callback dari peer)

use std::fmt;

/// Tipe request yang dikirim client
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Ping = 1,
    GetFlightIdentifiers = 2,
    GetFlightInformation = 3,
    MakeSeatReservation = 4,
    MonitorSeatUpdates = 5,
    UpdateFlightPrice = 6,
    CreateFlight = 7,
}

impl RequestKind {
    pub const ALL: [RequestKind; 7] = [
        Self::Ping,
        Self::GetFlightIdentifiers,
        Self::GetFlightInformation,
        Self::MakeSeatReservation,
        Self::MonitorSeatUpdates,
        Self::UpdateFlightPrice,
        Self::CreateFlight,
    ];

    #[inline(always)]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Ping),
            2 => Some(Self::GetFlightIdentifiers),
            3 => Some(Self::GetFlightInformation),
            4 => Some(Self::MakeSeatReservation),
            5 => Some(Self::MonitorSeatUpdates),
            6 => Some(Self::UpdateFlightPrice),
            7 => Some(Self::CreateFlight),
            _ => None,
        }
    }

    /// Response kind pasangan dari request ini
    #[inline(always)]
    pub fn response(self) -> ResponseKind {
        match self {
            Self::Ping => ResponseKind::Ping,
            Self::GetFlightIdentifiers => ResponseKind::GetFlightIdentifiers,
            Self::GetFlightInformation => ResponseKind::GetFlightInformation,
            Self::MakeSeatReservation => ResponseKind::MakeSeatReservation,
            Self::MonitorSeatUpdates => ResponseKind::MonitorSeatUpdates,
            Self::UpdateFlightPrice => ResponseKind::UpdateFlightPrice,
            Self::CreateFlight => ResponseKind::CreateFlight,
        }
    }
}

/// Tipe response dari peer
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    Ping = 101,
    GetFlightIdentifiers = 102,
    GetFlightInformation = 103,
    MakeSeatReservation = 104,
    MonitorSeatUpdates = 105,
    UpdateFlightPrice = 106,
    CreateFlight = 107,
    /// Push tanpa diminta selama monitor window
    MonitorPush = 201,
}

impl ResponseKind {
    #[inline(always)]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            101 => Some(Self::Ping),
            102 => Some(Self::GetFlightIdentifiers),
            103 => Some(Self::GetFlightInformation),
            104 => Some(Self::MakeSeatReservation),
            105 => Some(Self::MonitorSeatUpdates),
            106 => Some(Self::UpdateFlightPrice),
            107 => Some(Self::CreateFlight),
            201 => Some(Self::MonitorPush),
            _ => None,
        }
    }
}

/// Status byte di awal setiap response payload.
///
/// Selain `Success`, sisa payload tidak diinterpretasi.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Success = 1,
    GenericFailure = 2,
    MarshallerFailure = 3,
    NoMatchForSourceAndDestination = 4,
    NoSuchFlightIdentifier = 5,
    InsufficientSeats = 6,
}

impl StatusCode {
    #[inline(always)]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Success),
            2 => Some(Self::GenericFailure),
            3 => Some(Self::MarshallerFailure),
            4 => Some(Self::NoMatchForSourceAndDestination),
            5 => Some(Self::NoSuchFlightIdentifier),
            6 => Some(Self::InsufficientSeats),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Success => "success",
            Self::GenericFailure => "generic failure",
            Self::MarshallerFailure => "marshaller failure",
            Self::NoMatchForSourceAndDestination => "no match for source and destination",
            Self::NoSuchFlightIdentifier => "no such flight identifier",
            Self::InsufficientSeats => "insufficient number of available seats",
        };
        write!(f, "{} (status {})", text, *self as u8)
    }
}
