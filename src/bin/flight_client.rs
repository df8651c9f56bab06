//! Flight Client - command line front-end untuk request engine
//!
//! Satu subcommand = satu call. Engine dijalankan di thread ini sampai call
//! resolve (atau monitor window habis).
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin flight_client -- --server 127.0.0.1:8080 identifiers SIN KUL
//! cargo run --release --bin flight_client -- monitor 101 30
//! ```
//!
//! # Options
//!
//! - `--server ADDR` - Server address (default: 127.0.0.1:8080, env FLIGHT_SERVER_ADDR)
//! - `--timeout-ms MS` - Retransmission interval (default: 5000)
//! - `--retries N` - Retransmission maksimum (default: 3)
//! - `--drop-first-reply` - Buang balasan pertama (simulasi response hilang)

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use iris::network::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_INTERVAL};
use iris::{CallOptions, EngineConfig, NewFlight, Request, RequestEngine, Response};

#[derive(Debug, Parser)]
#[command(name = "flight_client", version, about = "Flight reservation client over UDP")]
struct Cli {
    /// Server address
    #[arg(long, env = "FLIGHT_SERVER_ADDR", default_value = "127.0.0.1:8080")]
    server: SocketAddr,

    /// Local bind address
    #[arg(long, default_value = "0.0.0.0:0")]
    bind: SocketAddr,

    /// Retransmission interval in milliseconds
    #[arg(long, default_value_t = DEFAULT_RETRY_INTERVAL.as_millis() as u64)]
    timeout_ms: u64,

    /// Retransmissions before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    retries: u32,

    /// Discard the first valid reply to exercise retransmission
    #[arg(long)]
    drop_first_reply: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Liveness check
    Ping,
    /// List flights between two places
    Identifiers { source: String, destination: String },
    /// Departure time, airfare and seats for one flight
    Info { flight_id: u32 },
    /// Reserve seats on a flight
    Reserve { flight_id: u32, seats: u32 },
    /// Receive seat updates for a flight during a window
    Monitor { flight_id: u32, seconds: u64 },
    /// Change the airfare of a flight
    UpdatePrice { flight_id: u32, price: f64 },
    /// Register a new flight
    Create {
        source: String,
        destination: String,
        /// Unix timestamp in seconds
        departure: u64,
        airfare: f64,
        seats: u32,
    },
}

impl Command {
    fn into_request(self) -> Request {
        match self {
            Self::Ping => Request::Ping,
            Self::Identifiers {
                source,
                destination,
            } => Request::GetFlightIdentifiers {
                source,
                destination,
            },
            Self::Info { flight_id } => Request::GetFlightInformation { flight_id },
            Self::Reserve { flight_id, seats } => Request::MakeSeatReservation { flight_id, seats },
            Self::Monitor { flight_id, seconds } => Request::MonitorSeatUpdates {
                flight_id,
                interval_secs: seconds,
            },
            Self::UpdatePrice { flight_id, price } => Request::UpdateFlightPrice {
                flight_id,
                new_price: price,
            },
            Self::Create {
                source,
                destination,
                departure,
                airfare,
                seats,
            } => Request::CreateFlight(NewFlight {
                source,
                destination,
                departure_time: departure,
                airfare,
                available_seats: seats,
            }),
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "call failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> iris::Result<()> {
    let config = EngineConfig::default()
        .retry_interval(Duration::from_millis(cli.timeout_ms))
        .max_retries(cli.retries);
    let mut engine = RequestEngine::bind(cli.bind, cli.server, config)?;
    debug!(local = %engine.local_addr()?, server = %cli.server, "client bound");

    let mut options = CallOptions::default();
    if cli.drop_first_reply {
        options = options.discard_first_reply();
    }

    let mut handle = engine.issue_with(cli.command.into_request(), options)?;

    // Drive engine sendiri supaya push bisa dicetak begitu datang
    let outcome = loop {
        if let Some(outcome) = handle.try_result() {
            break outcome;
        }
        engine.turn(Some(Duration::from_millis(100)))?;
        for update in handle.take_updates() {
            print_response(&update);
        }
    };

    for update in handle.take_updates() {
        print_response(&update);
    }
    print_response(&outcome?);
    Ok(())
}

fn print_response(response: &Response) {
    match response {
        Response::Pong => println!("pong"),
        Response::FlightIdentifiers(ids) if ids.is_empty() => println!("no flights"),
        Response::FlightIdentifiers(ids) => {
            let ids: Vec<String> = ids.iter().map(u32::to_string).collect();
            println!("flights: {}", ids.join(", "));
        }
        Response::FlightInformation(info) => println!(
            "departure: {}  airfare: {:.2}  seats available: {}",
            info.departure_time, info.airfare, info.available_seats
        ),
        Response::SeatsReserved => println!("reservation confirmed"),
        Response::MonitorSubscribed => println!("monitoring"),
        Response::PriceUpdated(flight) => println!(
            "flight {}: {} -> {}  departure: {}  airfare: {:.2}  seats available: {}",
            flight.flight_id,
            flight.source,
            flight.destination,
            flight.departure_time,
            flight.airfare,
            flight.available_seats
        ),
        Response::FlightCreated { flight_id } => println!("created flight {}", flight_id),
        Response::SeatUpdate { available_seats } => {
            println!("seat update: {} available", available_seats)
        }
        Response::MonitorClosed { updates } => {
            println!("monitor window closed after {} update(s)", updates)
        }
    }
}
