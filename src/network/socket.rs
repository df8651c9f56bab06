//! Datagram socket untuk engine.
//!
//! Satu socket UDP non-blocking per engine, dipakai untuk semua call
//! (multiplexing via correlation id), bukan satu socket per call.

use std::io;
use std::net::{SocketAddr, UdpSocket as StdUdpSocket};

use mio::net::UdpSocket;
use mio::{Interest, Registry, Token};

use crate::protocol::PACKET_SIZE;

/// Receive buffer per datagram. Lebih besar dari PACKET_SIZE supaya
/// datagram oversized terdeteksi, bukan terpotong diam-diam.
const RECV_SCRATCH_SIZE: usize = 2 * PACKET_SIZE;

pub struct DatagramSocket {
    socket: UdpSocket,
    peer: SocketAddr,
    // Pre-allocated buffer untuk recv
    scratch: Box<[u8]>,
}

impl DatagramSocket {
    /// Bind ke `local`, semua send ditujukan ke `peer`
    pub fn bind(local: SocketAddr, peer: SocketAddr, recv_buffer_size: usize) -> io::Result<Self> {
        let socket = StdUdpSocket::bind(local)?;
        socket.set_nonblocking(true)?;
        tune_recv_buffer(&socket, recv_buffer_size);

        Ok(Self {
            socket: UdpSocket::from_std(socket),
            peer,
            scratch: vec![0u8; RECV_SCRATCH_SIZE].into_boxed_slice(),
        })
    }

    pub fn register(&mut self, registry: &Registry, token: Token) -> io::Result<()> {
        registry.register(&mut self.socket, token, Interest::READABLE)
    }

    pub fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        registry.deregister(&mut self.socket)
    }

    /// Kirim satu packet utuh ke peer
    #[inline]
    pub fn send(&self, packet: &[u8]) -> io::Result<()> {
        let sent = self.socket.send_to(packet, self.peer)?;
        if sent != packet.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram send: {} of {} bytes", sent, packet.len()),
            ));
        }
        Ok(())
    }

    /// Terima satu datagram. `None` jika tidak ada data (WouldBlock).
    ///
    /// Data di-copy keluar dari scratch buffer (menghindari borrow conflict
    /// dengan state engine).
    #[inline]
    pub fn recv(&mut self) -> io::Result<Option<(Vec<u8>, SocketAddr)>> {
        match self.socket.recv_from(&mut self.scratch) {
            Ok((n, addr)) => Ok(Some((self.scratch[..n].to_vec(), addr))),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

/// Perbesar SO_RCVBUF supaya burst fragment/push tidak di-drop kernel
#[cfg(unix)]
fn tune_recv_buffer(socket: &StdUdpSocket, size: usize) {
    use std::os::unix::io::AsRawFd;

    let fd = socket.as_raw_fd();
    let optval: libc::c_int = size.min(libc::c_int::MAX as usize) as libc::c_int;
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc != 0 {
        tracing::warn!(
            size,
            error = %io::Error::last_os_error(),
            "unable to set SO_RCVBUF"
        );
    }
}

#[cfg(not(unix))]
fn tune_recv_buffer(_socket: &StdUdpSocket, _size: usize) {}
