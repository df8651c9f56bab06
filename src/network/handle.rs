//! Deferred result untuk satu call.
//!
//! `issue` langsung mengembalikan `CallHandle`; hasilnya diisi belakangan
//! oleh event handler engine (datagram atau timer). Handle bisa dipindah ke
//! thread lain sementara pemilik engine menjalankan event loop.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use crate::error::{Error, Result};
use crate::protocol::{CorrelationId, RequestKind, Response};

/// Event yang dikirim engine ke handle
#[derive(Debug)]
pub(crate) enum CallEvent {
    /// Monitor subscription diterima peer
    Subscribed,
    /// Push selama monitor window
    Push(Response),
    /// Resolusi akhir, tepat satu kali
    Resolved(Result<Response>),
}

pub(crate) type CallSink = Sender<CallEvent>;

pub struct CallHandle {
    id: CorrelationId,
    kind: RequestKind,
    rx: Receiver<CallEvent>,
    subscribed: bool,
    updates: Vec<Response>,
    outcome: Option<Result<Response>>,
    taken: bool,
}

impl CallHandle {
    pub(crate) fn new(id: CorrelationId, kind: RequestKind, rx: Receiver<CallEvent>) -> Self {
        Self {
            id,
            kind,
            rx,
            subscribed: false,
            updates: Vec::new(),
            outcome: None,
            taken: false,
        }
    }

    pub fn id(&self) -> CorrelationId {
        self.id
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Hasil akhir jika sudah resolve. Hanya dikembalikan sekali.
    pub fn try_result(&mut self) -> Option<Result<Response>> {
        self.pump();
        if self.outcome.is_some() {
            self.taken = true;
        }
        self.outcome.take()
    }

    /// Sudah resolve (termasuk jika hasilnya sudah diambil)
    pub fn is_resolved(&mut self) -> bool {
        self.pump();
        self.taken || self.outcome.is_some()
    }

    /// Monitor call sudah di-acknowledge peer
    pub fn is_subscribed(&mut self) -> bool {
        self.pump();
        self.subscribed
    }

    /// Ambil semua push yang sudah masuk
    pub fn take_updates(&mut self) -> Vec<Response> {
        self.pump();
        std::mem::take(&mut self.updates)
    }

    /// Block sampai resolve. Hanya aman jika thread lain menjalankan engine.
    pub fn wait_blocking(mut self) -> Result<Response> {
        if let Some(outcome) = self.try_result() {
            return outcome;
        }
        loop {
            match self.rx.recv() {
                Ok(CallEvent::Resolved(outcome)) => return outcome,
                Ok(event) => self.absorb(event),
                // Engine di-drop tanpa resolve: anggap cancel
                Err(_) => return Err(Error::Cancelled),
            }
        }
    }

    fn pump(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.absorb(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.outcome.is_none() && !self.taken {
                        self.outcome = Some(Err(Error::Cancelled));
                    }
                    break;
                }
            }
        }
    }

    fn absorb(&mut self, event: CallEvent) {
        match event {
            CallEvent::Subscribed => self.subscribed = true,
            CallEvent::Push(update) => self.updates.push(update),
            CallEvent::Resolved(outcome) => self.outcome = Some(outcome),
        }
    }
}

impl std::fmt::Debug for CallHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("subscribed", &self.subscribed)
            .field("updates", &self.updates.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn handle() -> (CallSink, CallHandle) {
        let (tx, rx) = mpsc::channel();
        let id = "handle001".parse().unwrap();
        (tx, CallHandle::new(id, RequestKind::MonitorSeatUpdates, rx))
    }

    #[test]
    fn test_pending_then_resolved_once() {
        let (tx, mut handle) = handle();
        assert!(handle.try_result().is_none());
        assert!(!handle.is_resolved());

        tx.send(CallEvent::Resolved(Ok(Response::Pong))).unwrap();
        assert_eq!(handle.try_result().unwrap().unwrap(), Response::Pong);
        assert!(handle.try_result().is_none());
        assert!(handle.is_resolved());
    }

    #[test]
    fn test_updates_collected() {
        let (tx, mut handle) = handle();
        tx.send(CallEvent::Subscribed).unwrap();
        tx.send(CallEvent::Push(Response::SeatUpdate { available_seats: 9 }))
            .unwrap();

        assert!(handle.is_subscribed());
        assert_eq!(
            handle.take_updates(),
            vec![Response::SeatUpdate { available_seats: 9 }]
        );
        assert!(handle.take_updates().is_empty());
    }

    #[test]
    fn test_dropped_sender_is_cancel() {
        let (tx, mut handle) = handle();
        drop(tx);
        assert!(matches!(handle.try_result(), Some(Err(Error::Cancelled))));
    }

    #[test]
    fn test_wait_blocking_across_threads() {
        let (tx, handle) = handle();
        let worker = std::thread::spawn(move || handle.wait_blocking());
        tx.send(CallEvent::Resolved(Ok(Response::SeatsReserved)))
            .unwrap();
        assert_eq!(worker.join().unwrap().unwrap(), Response::SeatsReserved);
    }
}
