//! Fake flight server untuk integration test.
//!
//! Berjalan di thread sendiri dengan std UdpSocket. Setiap request yang
//! masuk dicatat (bytes mentah), di-decode, lalu diserahkan ke handler yang
//! menentukan packet balasan.

#![allow(dead_code)]

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use iris::protocol::{
    packetize, CorrelationId, Header, Reply, Request, Response, ResponseKind, StatusCode,
    HEADER_SIZE,
};

/// Satu kiriman dari peer
pub struct Outgoing {
    /// Jeda sebelum dikirim (relatif ke kiriman sebelumnya)
    pub after: Duration,
    pub packets: Vec<Vec<u8>>,
    /// Kirim dari socket lain (callback socket)
    pub from_side_socket: bool,
}

impl Outgoing {
    pub fn now(packets: Vec<Vec<u8>>) -> Self {
        Self {
            after: Duration::ZERO,
            packets,
            from_side_socket: false,
        }
    }

    pub fn later(after: Duration, packets: Vec<Vec<u8>>) -> Self {
        Self {
            after,
            packets,
            from_side_socket: false,
        }
    }

    pub fn from_side_socket(mut self) -> Self {
        self.from_side_socket = true;
        self
    }
}

pub struct FakePeer {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FakePeer {
    /// Jalankan peer; `handler` menerima header + request yang sudah di-decode
    /// dan mengembalikan balasan
    pub fn spawn<F>(mut handler: F) -> Self
    where
        F: FnMut(&Header, &Request) -> Vec<Outgoing> + Send + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(20)))
            .unwrap();
        let side = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = socket.local_addr().unwrap();

        let received = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let worker = {
            let received = Arc::clone(&received);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut buf = [0u8; 1024];
                while !stop.load(Ordering::Relaxed) {
                    let (n, from) = match socket.recv_from(&mut buf) {
                        Ok(r) => r,
                        Err(_) => continue,
                    };
                    let datagram = buf[..n].to_vec();
                    received.lock().unwrap().push(datagram.clone());

                    let Ok(header) = Header::deconstruct(&datagram) else {
                        continue;
                    };
                    let Some(kind) = iris::RequestKind::from_u8(header.kind) else {
                        continue;
                    };
                    let Ok(request) = Request::decode(kind, &datagram[HEADER_SIZE..]) else {
                        continue;
                    };

                    for out in handler(&header, &request) {
                        if !out.after.is_zero() {
                            thread::sleep(out.after);
                        }
                        let via = if out.from_side_socket { &side } else { &socket };
                        for packet in &out.packets {
                            let _ = via.send_to(packet, from);
                        }
                    }
                }
            })
        };

        Self {
            addr,
            received,
            stop,
            worker: Some(worker),
        }
    }

    /// Peer yang tidak pernah membalas
    pub fn silent() -> Self {
        Self::spawn(|_, _| Vec::new())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Salinan semua datagram yang diterima sejauh ini
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap().clone()
    }

    pub fn received_count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    /// Tunggu sampai minimal `count` datagram diterima
    pub fn wait_for_received(&self, count: usize, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        loop {
            let n = self.received_count();
            if n >= count || Instant::now() >= deadline {
                return n;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }
}

impl Drop for FakePeer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Packet balasan sukses untuk request dengan header ini
pub fn reply(header: &Header, response: &Response) -> Vec<Vec<u8>> {
    let kind = response.kind().unwrap();
    packetize(kind as u8, header.correlation_id, &response.encode().unwrap()).unwrap()
}

/// Packet balasan dengan status gagal
pub fn failure(header: &Header, kind: ResponseKind, code: StatusCode) -> Vec<Vec<u8>> {
    packetize(kind as u8, header.correlation_id, &Reply::encode_failure(code)).unwrap()
}

/// Satu push 201 dengan correlation id tertentu
pub fn push(correlation_id: CorrelationId, available_seats: u32) -> Vec<Vec<u8>> {
    let payload = Response::SeatUpdate { available_seats }.encode().unwrap();
    let mut packet = vec![0u8; iris::protocol::PACKET_SIZE];
    let header = Header::single(ResponseKind::MonitorPush as u8, correlation_id);
    packet[..HEADER_SIZE].copy_from_slice(&header.to_bytes().unwrap());
    packet[HEADER_SIZE..HEADER_SIZE + payload.len()].copy_from_slice(&payload);
    vec![packet]
}
