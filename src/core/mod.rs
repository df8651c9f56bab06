//! Core module: timer queue dan correlation id generator
//!
//! Prinsip desain:
//! - Single-owner: dimiliki satu engine, tidak ada Mutex/RwLock
//! - Deterministic: generator bisa di-seed untuk test

mod correlation;
mod timer;

pub use correlation::IdGenerator;
pub use timer::{TimerId, TimerQueue};
