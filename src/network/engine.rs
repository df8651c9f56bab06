//! Request Engine dengan event-driven I/O
//!
//! Menggunakan mio untuk non-blocking UDP. Hanya ada dua sumber event:
//! - datagram masuk (socket readable)
//! - timer jatuh tempo (retry atau akhir monitor window)
//!
//! Handler berjalan sampai selesai tanpa preemption, jadi registry tidak
//! perlu lock selama semua mutasi terjadi di sini.
//!
//! State per call:
//! `Sent → {Acked | Retried¹…ⁿ → Failed}`, dan untuk monitor
//! `Acked → Monitoring → Closed`.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use mio::{Events, Poll, Token};
use tracing::{debug, info, trace, warn};

use super::config::{CallOptions, EngineConfig};
use super::handle::CallHandle;
use super::registry::{CallState, PendingCall, PendingCallRegistry};
use super::socket::DatagramSocket;
use crate::core::{IdGenerator, TimerQueue};
use crate::error::{Error, Result};
use crate::protocol::{
    packetize, CorrelationId, Header, Reply, Request, RequestKind, Response, ResponseKind,
    HEADER_SIZE,
};

const SOCKET_TOKEN: Token = Token(0);

/// Jarak maksimum deadline dari sekarang (~100 tahun). Interval yang lebih
/// panjang (mis. monitor `u64::MAX` detik) di-clamp ke sini.
const MAX_TIMER_SPAN: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// `now + span` tanpa overflow
#[inline]
fn deadline_after(now: Instant, span: Duration) -> Instant {
    now.checked_add(span.min(MAX_TIMER_SPAN)).unwrap_or(now)
}

/// Event yang dijadwalkan di timer queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    Retry(CorrelationId),
    MonitorExpiry(CorrelationId),
}

/// Client-side request engine.
///
/// Satu engine memiliki tepat satu socket UDP dan men-multiplex semua call
/// di atasnya melalui tabel correlation id.
pub struct RequestEngine {
    poll: Poll,
    events: Events,
    socket: Option<DatagramSocket>,
    registry: PendingCallRegistry,
    timers: TimerQueue<TimerEvent>,
    ids: IdGenerator,
    config: EngineConfig,
}

impl RequestEngine {
    /// Bind ke port acak (unspecified address, family sama dengan peer)
    pub fn connect(peer: SocketAddr, config: EngineConfig) -> Result<Self> {
        let local = match peer.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        Self::bind(local, peer, config)
    }

    pub fn bind(local: SocketAddr, peer: SocketAddr, config: EngineConfig) -> Result<Self> {
        let poll = Poll::new()?;
        let mut socket = DatagramSocket::bind(local, peer, config.recv_buffer_size)?;
        socket.register(poll.registry(), SOCKET_TOKEN)?;

        let ids = match config.id_seed {
            Some(seed) => IdGenerator::with_seed(seed),
            None => IdGenerator::new(),
        };

        info!(
            local = %socket.local_addr()?,
            peer = %peer,
            retry_interval = ?config.retry_interval,
            max_retries = config.max_retries,
            "request engine ready"
        );

        Ok(Self {
            poll,
            events: Events::with_capacity(config.events_capacity),
            socket: Some(socket),
            registry: PendingCallRegistry::new(),
            timers: TimerQueue::new(),
            ids,
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        match &self.socket {
            Some(socket) => Ok(socket.local_addr()?),
            None => Err(Error::Cancelled),
        }
    }

    /// Jumlah call yang belum resolve
    pub fn pending(&self) -> usize {
        self.registry.len()
    }

    pub fn is_closed(&self) -> bool {
        self.socket.is_none()
    }

    /// Issue call dengan opsi default
    pub fn issue(&mut self, request: Request) -> Result<CallHandle> {
        self.issue_with(request, CallOptions::default())
    }

    /// Issue call: encode, frame, kirim, arm retry timer.
    ///
    /// Non-blocking. Error encode dan send dikembalikan langsung; selain
    /// itu hasil datang lewat `CallHandle`.
    pub fn issue_with(&mut self, request: Request, options: CallOptions) -> Result<CallHandle> {
        if self.socket.is_none() {
            return Err(Error::Cancelled);
        }

        let kind = request.kind();
        let payload = request.encode()?;

        let id = match options.correlation_id {
            Some(id) if self.registry.contains(&id) => {
                return Err(Error::InvalidHeaderField(format!(
                    "correlation id {} is already in use by a pending call",
                    id
                )));
            }
            Some(id) => id,
            None => {
                let registry = &self.registry;
                self.ids.fresh(|candidate| registry.contains(candidate))
            }
        };

        let packets = packetize(kind as u8, id, &payload)?;
        send_all(self.socket.as_ref(), &packets)?;

        let monitor_window = match request {
            Request::MonitorSeatUpdates { interval_secs, .. } => {
                Some(Duration::from_secs(interval_secs))
            }
            _ => None,
        };

        let (tx, rx) = mpsc::channel();
        let mut call = PendingCall::new(
            id,
            kind,
            packets,
            monitor_window,
            options.discard_first_reply,
            tx,
        );
        call.retry_timer = Some(
            self.timers.schedule(
                deadline_after(Instant::now(), self.config.retry_interval),
                TimerEvent::Retry(id),
            ),
        );

        debug!(
            correlation_id = %id,
            kind = ?kind,
            fragments = call.packets.len(),
            payload_len = payload.len(),
            "call issued"
        );
        self.registry.insert(call);

        Ok(CallHandle::new(id, kind, rx))
    }

    /// Issue lalu jalankan event loop sampai call resolve
    pub fn call(&mut self, request: Request) -> Result<Response> {
        let mut handle = self.issue(request)?;
        self.wait(&mut handle)
    }

    /// Jalankan event loop sampai `handle` resolve
    pub fn wait(&mut self, handle: &mut CallHandle) -> Result<Response> {
        loop {
            if let Some(outcome) = handle.try_result() {
                return outcome;
            }
            if !self.registry.contains(&handle.id()) {
                // Bukan milik engine ini, atau hasilnya sudah diambil
                return Err(Error::Cancelled);
            }
            self.turn(None)?;
        }
    }

    /// Jalankan event loop sampai tidak ada call yang pending
    pub fn run_until_idle(&mut self) -> Result<()> {
        while !self.registry.is_empty() {
            self.turn(None)?;
        }
        Ok(())
    }

    /// Satu iterasi event loop.
    ///
    /// Poll socket dengan timeout = min(`timeout`, deadline timer terdekat),
    /// drain semua datagram, lalu jalankan timer yang jatuh tempo.
    pub fn turn(&mut self, timeout: Option<Duration>) -> Result<()> {
        if self.socket.is_none() {
            return Err(Error::Cancelled);
        }

        let until_deadline = self
            .timers
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()));
        let poll_timeout = match (timeout, until_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        match self.poll.poll(&mut self.events, poll_timeout) {
            Ok(()) => {}
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => return Ok(()),
            Err(e) => return Err(Error::Transport(e)),
        }

        let readable = self
            .events
            .iter()
            .any(|event| event.token() == SOCKET_TOKEN && event.is_readable());
        if readable {
            self.drain_socket();
        }

        self.fire_due_timers(Instant::now());
        Ok(())
    }

    /// Resolve semua call pending dengan `Cancelled` dan tutup socket
    pub fn shutdown(&mut self) {
        let Some(mut socket) = self.socket.take() else {
            return;
        };

        let cancelled = self.registry.len();
        for call in self.registry.drain() {
            call.resolve(Err(Error::Cancelled));
        }
        self.timers.clear();

        if let Err(e) = socket.deregister(self.poll.registry()) {
            debug!(error = %e, "deregister on shutdown failed");
        }
        info!(cancelled, "request engine shut down");
    }

    /// Baca sampai WouldBlock (mio edge-triggered)
    fn drain_socket(&mut self) {
        loop {
            let received = match self.socket.as_mut() {
                Some(socket) => socket.recv(),
                None => return,
            };
            match received {
                Ok(Some((datagram, from))) => {
                    trace!(from = %from, len = datagram.len(), "datagram received");
                    self.handle_datagram(&datagram);
                }
                Ok(None) => return,
                Err(e) => {
                    // ICMP port unreachable dll. muncul di sini; call tetap
                    // menunggu timer retry
                    warn!(error = %e, "recv failed");
                    return;
                }
            }
        }
    }

    fn handle_datagram(&mut self, datagram: &[u8]) {
        let header = match Header::deconstruct(datagram) {
            Ok(header) => header,
            Err(e) => {
                warn!(error = %e, "dropping malformed datagram");
                return;
            }
        };
        let payload = &datagram[HEADER_SIZE..];

        let Some(kind) = ResponseKind::from_u8(header.kind) else {
            warn!(
                correlation_id = %header.correlation_id,
                kind = header.kind,
                "dropping datagram with unknown response kind"
            );
            return;
        };

        let id = if self.registry.contains(&header.correlation_id) {
            header.correlation_id
        } else if kind == ResponseKind::MonitorPush {
            // Peer boleh memberi push correlation id sendiri
            match self.registry.sole_monitoring() {
                Some(id) => id,
                None => {
                    warn!(correlation_id = %header.correlation_id, "dropping unattributable push");
                    return;
                }
            }
        } else {
            debug!(
                correlation_id = %header.correlation_id,
                kind = ?kind,
                "reply for unknown or closed call ignored"
            );
            return;
        };

        let state = match self.registry.get(&id) {
            Some(call) => call.state,
            None => return,
        };
        match state {
            CallState::Sent => self.handle_reply(id, kind, &header, payload),
            CallState::Monitoring => self.handle_push(id, kind, &header, payload),
        }
    }

    fn handle_reply(&mut self, id: CorrelationId, kind: ResponseKind, header: &Header, payload: &[u8]) {
        let Some(call) = self.registry.get_mut(&id) else {
            return;
        };

        if kind != call.kind.response() {
            warn!(
                correlation_id = %id,
                expected = ?call.kind.response(),
                got = ?kind,
                "dropping reply with mismatched kind"
            );
            return;
        }

        if call.discard_first_reply && !call.discarded {
            call.discarded = true;
            info!(correlation_id = %id, "discarding first reply (simulated response loss)");
            return;
        }

        let joined = match call.accept_fragment(header, payload) {
            Ok(Some(joined)) => joined,
            Ok(None) => {
                trace!(
                    correlation_id = %id,
                    index = header.fragment_index,
                    total = header.fragment_total,
                    "fragment buffered"
                );
                return;
            }
            Err(e) => {
                warn!(correlation_id = %id, error = %e, "dropping bad fragment");
                return;
            }
        };

        // Reply lengkap: retry timer milik call ini saja yang di-cancel
        if let Some(timer) = call.retry_timer.take() {
            self.timers.cancel(timer);
        }

        let reply = Reply::decode(kind, &joined);
        let window = match (&reply, call.kind, call.monitor_window) {
            (Ok(Reply::Success(Response::MonitorSubscribed)), RequestKind::MonitorSeatUpdates, Some(window)) => {
                Some(window)
            }
            _ => None,
        };

        if let Some(window) = window {
            call.state = CallState::Monitoring;
            call.monitor_timer = Some(
                self.timers.schedule(
                    deadline_after(Instant::now(), window),
                    TimerEvent::MonitorExpiry(id),
                ),
            );
            call.notify_subscribed();
            info!(
                correlation_id = %id,
                window_secs = window.as_secs(),
                "monitor subscription acknowledged"
            );
            return;
        }

        let Some(call) = self.registry.remove(&id) else {
            return;
        };
        let outcome = reply.and_then(Reply::into_result);
        match &outcome {
            Ok(_) => debug!(correlation_id = %id, attempts = call.attempts(), "call acked"),
            Err(e) => info!(correlation_id = %id, error = %e, "call failed"),
        }
        call.resolve(outcome);
    }

    fn handle_push(&mut self, id: CorrelationId, kind: ResponseKind, header: &Header, payload: &[u8]) {
        let Some(call) = self.registry.get_mut(&id) else {
            return;
        };

        if kind != ResponseKind::MonitorPush {
            debug!(correlation_id = %id, kind = ?kind, "ignoring non-push while monitoring");
            return;
        }

        let joined = match call.accept_fragment(header, payload) {
            Ok(Some(joined)) => joined,
            Ok(None) => return,
            Err(e) => {
                warn!(correlation_id = %id, error = %e, "dropping bad push fragment");
                return;
            }
        };

        match Reply::decode(kind, &joined) {
            Ok(Reply::Success(update)) => {
                debug!(correlation_id = %id, update = ?update, "monitor push");
                call.push_update(update);
            }
            Ok(Reply::Failure(code)) => {
                warn!(correlation_id = %id, status = %code, "push reported failure");
            }
            Err(e) => warn!(correlation_id = %id, error = %e, "undecodable push"),
        }
    }

    fn fire_due_timers(&mut self, now: Instant) {
        while let Some((_, event)) = self.timers.pop_due(now) {
            match event {
                TimerEvent::Retry(id) => self.on_retry_timer(id),
                TimerEvent::MonitorExpiry(id) => self.on_monitor_expiry(id),
            }
        }
    }

    fn on_retry_timer(&mut self, id: CorrelationId) {
        let Some(call) = self.registry.get_mut(&id) else {
            return;
        };
        call.retry_timer = None;

        if call.retries >= self.config.max_retries {
            let attempts = call.attempts();
            if let Some(call) = self.registry.remove(&id) {
                warn!(correlation_id = %id, attempts, "retries exhausted");
                call.resolve(Err(Error::RetriesExhausted { attempts }));
            }
            return;
        }

        call.retries += 1;
        // At-least-once: packet identik, correlation id sama. Dedup adalah
        // tanggung jawab peer.
        warn!(
            correlation_id = %id,
            attempt = call.attempts(),
            "no reply within interval, retransmitting"
        );

        if let Err(e) = send_all(self.socket.as_ref(), &call.packets) {
            if let Some(call) = self.registry.remove(&id) {
                warn!(correlation_id = %id, error = %e, "retransmission failed");
                call.resolve(Err(e));
            }
            return;
        }

        call.retry_timer = Some(
            self.timers.schedule(
                deadline_after(Instant::now(), self.config.retry_interval),
                TimerEvent::Retry(id),
            ),
        );
    }

    fn on_monitor_expiry(&mut self, id: CorrelationId) {
        let Some(mut call) = self.registry.remove(&id) else {
            return;
        };
        call.monitor_timer = None;
        if let Some(timer) = call.retry_timer.take() {
            self.timers.cancel(timer);
        }

        info!(correlation_id = %id, updates = call.updates, "monitor window closed");
        let updates = call.updates;
        call.resolve(Ok(Response::MonitorClosed { updates }));
    }
}

impl Drop for RequestEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Kirim semua fragment; socket `None` berarti engine sudah shutdown
fn send_all(socket: Option<&DatagramSocket>, packets: &[Vec<u8>]) -> Result<()> {
    let socket = socket.ok_or(Error::Cancelled)?;
    for packet in packets {
        socket.send(packet)?;
    }
    Ok(())
}
