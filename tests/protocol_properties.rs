//! Property-based tests untuk protocol layer.
//!
//! Fokus pada invariant yang tidak tergantung contoh spesifik:
//! header bertahan bolak-balik, reassembly tidak tergantung urutan
//! kedatangan, dan parser tidak pernah panic pada input acak.

use proptest::prelude::*;

use iris::protocol::{
    packetize, CorrelationId, FlightInformation, FlightRecord, Header, NewFlight, Reassembly,
    Reply, Request, RequestKind, Response, ResponseKind, HEADER_SIZE, MAX_FRAGMENT_PAYLOAD,
    PACKET_SIZE,
};

fn correlation_id() -> impl Strategy<Value = CorrelationId> {
    "[!-~]{9}".prop_map(|s| s.parse().unwrap())
}

fn text() -> impl Strategy<Value = String> {
    "[^\\x00]{0,40}"
}

fn price() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite price", |v| v.is_finite())
}

fn any_request() -> impl Strategy<Value = Request> {
    prop_oneof![
        Just(Request::Ping),
        (text(), text()).prop_map(|(source, destination)| Request::GetFlightIdentifiers {
            source,
            destination,
        }),
        any::<u32>().prop_map(|flight_id| Request::GetFlightInformation { flight_id }),
        (any::<u32>(), any::<u32>())
            .prop_map(|(flight_id, seats)| Request::MakeSeatReservation { flight_id, seats }),
        (any::<u32>(), any::<u64>()).prop_map(|(flight_id, interval_secs)| {
            Request::MonitorSeatUpdates {
                flight_id,
                interval_secs,
            }
        }),
        (any::<u32>(), price())
            .prop_map(|(flight_id, new_price)| Request::UpdateFlightPrice { flight_id, new_price }),
        (text(), text(), any::<u64>(), price(), any::<u32>()).prop_map(
            |(source, destination, departure_time, airfare, available_seats)| {
                Request::CreateFlight(NewFlight {
                    source,
                    destination,
                    departure_time,
                    airfare,
                    available_seats,
                })
            }
        ),
    ]
}

fn any_response() -> impl Strategy<Value = Response> {
    prop_oneof![
        Just(Response::Pong),
        // Sampai ~2400 byte: memaksa reply multi-fragment
        proptest::collection::vec(any::<u32>(), 0..600).prop_map(Response::FlightIdentifiers),
        (any::<u64>(), price(), any::<u32>()).prop_map(
            |(departure_time, airfare, available_seats)| {
                Response::FlightInformation(FlightInformation {
                    departure_time,
                    airfare,
                    available_seats,
                })
            }
        ),
        Just(Response::SeatsReserved),
        Just(Response::MonitorSubscribed),
        (any::<u32>(), text(), text(), any::<u64>(), price(), any::<u32>()).prop_map(
            |(flight_id, source, destination, departure_time, airfare, available_seats)| {
                Response::PriceUpdated(FlightRecord {
                    flight_id,
                    source,
                    destination,
                    departure_time,
                    airfare,
                    available_seats,
                })
            }
        ),
        any::<u32>().prop_map(|flight_id| Response::FlightCreated { flight_id }),
        any::<u32>().prop_map(|available_seats| Response::SeatUpdate { available_seats }),
    ]
}

/// Packetize ke 512 byte, parse header tiap packet, reassemble
fn through_wire(kind: u8, id: CorrelationId, payload: &[u8]) -> Vec<u8> {
    let packets = packetize(kind, id, payload).unwrap();
    let first = Header::deconstruct(&packets[0]).unwrap();
    let mut buffer = Reassembly::new(&first);
    let mut joined = None;
    for packet in &packets {
        assert_eq!(packet.len(), PACKET_SIZE);
        let header = Header::deconstruct(packet).unwrap();
        assert_eq!(header.correlation_id, id);
        joined = buffer.push(&header, &packet[HEADER_SIZE..]).unwrap();
    }
    let joined = joined.unwrap();
    assert_eq!(joined.len() % MAX_FRAGMENT_PAYLOAD, 0);
    joined
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn header_survives_wire(
        kind in any::<u8>(),
        id in correlation_id(),
        total in 1u64..u64::MAX,
        pick in any::<u64>(),
    ) {
        let header = Header {
            kind,
            correlation_id: id,
            fragment_index: pick % total + 1,
            fragment_total: total,
        };
        let bytes = header.to_bytes().unwrap();
        prop_assert_eq!(Header::deconstruct(&bytes).unwrap(), header);
    }

    #[test]
    fn reassembly_is_order_independent(
        payload in proptest::collection::vec(any::<u8>(), 0..4 * MAX_FRAGMENT_PAYLOAD),
        id in correlation_id(),
        seed in any::<u64>(),
    ) {
        let mut packets = packetize(102, id, &payload).unwrap();
        prop_assert!(packets.iter().all(|p| p.len() == PACKET_SIZE));

        // Fisher-Yates dengan seed dari proptest
        let mut state = seed;
        for i in (1..packets.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = (state >> 33) as usize % (i + 1);
            packets.swap(i, j);
        }

        let first = Header::deconstruct(&packets[0]).unwrap();
        let mut buffer = Reassembly::new(&first);
        let mut released = None;
        for packet in &packets {
            let header = Header::deconstruct(packet).unwrap();
            prop_assert!(released.is_none());
            released = buffer.push(&header, &packet[HEADER_SIZE..]).unwrap();
        }

        let joined = released.unwrap();
        prop_assert_eq!(&joined[..payload.len()], payload.as_slice());
        prop_assert!(joined[payload.len()..].iter().all(|b| *b == 0));
    }

    #[test]
    fn parsers_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..PACKET_SIZE)) {
        let _ = Header::deconstruct(&bytes);
        for kind in RequestKind::ALL {
            let _ = Request::decode(kind, &bytes);
            let _ = Reply::decode(kind.response(), &bytes);
        }
        let _ = Reply::decode(ResponseKind::MonitorPush, &bytes);
    }

    #[test]
    fn every_request_survives_wire(request in any_request(), id in correlation_id()) {
        let payload = request.encode().unwrap();
        let joined = through_wire(request.kind() as u8, id, &payload);
        prop_assert_eq!(Request::decode(request.kind(), &joined).unwrap(), request);
    }

    #[test]
    fn every_response_survives_wire(response in any_response(), id in correlation_id()) {
        let kind = response.kind().unwrap();
        let payload = response.encode().unwrap();
        let joined = through_wire(kind as u8, id, &payload);
        prop_assert_eq!(Reply::decode(kind, &joined).unwrap(), Reply::Success(response));
    }
}
