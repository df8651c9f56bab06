//! Pending-call registry: tabel call yang masih aktif, per correlation id.
//!
//! Dimiliki satu engine (bukan global). Semua mutasi terjadi di dalam event
//! handler engine, jadi tidak perlu lock.

use std::collections::HashMap;
use std::time::Duration;

use super::handle::{CallEvent, CallSink};
use crate::core::TimerId;
use crate::error::{Error, Result};
use crate::protocol::{CorrelationId, Header, Reassembly, RequestKind, Response};

/// State satu call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Terkirim, menunggu balasan (termasuk setelah retry)
    Sent,
    /// Subscription di-acknowledge, menerima push sampai window habis
    Monitoring,
}

pub struct PendingCall {
    pub id: CorrelationId,
    pub kind: RequestKind,
    /// Packet lengkap untuk dikirim ulang apa adanya
    pub packets: Vec<Vec<u8>>,
    pub retries: u32,
    pub retry_timer: Option<TimerId>,
    pub monitor_timer: Option<TimerId>,
    pub state: CallState,
    /// Panjang monitor window (hanya untuk MonitorSeatUpdates)
    pub monitor_window: Option<Duration>,
    pub discard_first_reply: bool,
    pub discarded: bool,
    pub updates: usize,
    reassembly: Option<Reassembly>,
    sink: CallSink,
}

impl PendingCall {
    pub(crate) fn new(
        id: CorrelationId,
        kind: RequestKind,
        packets: Vec<Vec<u8>>,
        monitor_window: Option<Duration>,
        discard_first_reply: bool,
        sink: CallSink,
    ) -> Self {
        Self {
            id,
            kind,
            packets,
            retries: 0,
            retry_timer: None,
            monitor_timer: None,
            state: CallState::Sent,
            monitor_window,
            discard_first_reply,
            discarded: false,
            updates: 0,
            reassembly: None,
            sink,
        }
    }

    /// Total pengiriman sejauh ini (pertama + retry)
    #[inline(always)]
    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Masukkan satu fragment. Returns payload lengkap saat semua fragment ada.
    ///
    /// Fragment dari set lain (total/kind beda) memulai buffer baru.
    pub fn accept_fragment(&mut self, header: &Header, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        if header.is_single_fragment() && self.reassembly.is_none() {
            return Ok(Some(payload.to_vec()));
        }

        let buffer = self
            .reassembly
            .get_or_insert_with(|| Reassembly::new(header));
        let joined = match buffer.push(header, payload) {
            Ok(joined) => joined,
            Err(Error::InvalidHeaderField(reason)) => {
                tracing::debug!(correlation_id = %self.id, %reason, "restarting reassembly");
                let mut fresh = Reassembly::new(header);
                let joined = fresh.push(header, payload)?;
                self.reassembly = Some(fresh);
                joined
            }
            Err(e) => return Err(e),
        };

        if joined.is_some() {
            self.reassembly = None;
        }
        Ok(joined)
    }

    pub(crate) fn notify_subscribed(&self) {
        let _ = self.sink.send(CallEvent::Subscribed);
    }

    pub(crate) fn push_update(&mut self, update: Response) {
        self.updates += 1;
        let _ = self.sink.send(CallEvent::Push(update));
    }

    /// Resolusi akhir. Mengonsumsi call, jadi tidak bisa resolve dua kali.
    pub(crate) fn resolve(self, outcome: Result<Response>) {
        // Receiver boleh sudah di-drop oleh caller
        let _ = self.sink.send(CallEvent::Resolved(outcome));
    }
}

#[derive(Default)]
pub struct PendingCallRegistry {
    calls: HashMap<CorrelationId, PendingCall>,
}

impl PendingCallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, call: PendingCall) {
        self.calls.insert(call.id, call);
    }

    pub fn contains(&self, id: &CorrelationId) -> bool {
        self.calls.contains_key(id)
    }

    pub fn get(&self, id: &CorrelationId) -> Option<&PendingCall> {
        self.calls.get(id)
    }

    pub fn get_mut(&mut self, id: &CorrelationId) -> Option<&mut PendingCall> {
        self.calls.get_mut(id)
    }

    pub fn remove(&mut self, id: &CorrelationId) -> Option<PendingCall> {
        self.calls.remove(id)
    }

    /// Satu-satunya call dalam state Monitoring, jika tepat satu
    pub fn sole_monitoring(&self) -> Option<CorrelationId> {
        let mut monitoring = self
            .calls
            .values()
            .filter(|c| c.state == CallState::Monitoring)
            .map(|c| c.id);
        match (monitoring.next(), monitoring.next()) {
            (Some(id), None) => Some(id),
            _ => None,
        }
    }

    pub fn drain(&mut self) -> impl Iterator<Item = PendingCall> + '_ {
        self.calls.drain().map(|(_, call)| call)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
