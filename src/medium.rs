//! The virtual RF medium: a multicast UDP group every emulated radio joins.
//!
//! Ported from `original_source/src/virtualLink.c`. A `MediumEndpoint` owns
//! two sockets — one bound to this endpoint's own TX identity (used to send,
//! and to recognize and drop our own transmissions on receive), and one
//! joined to the shared multicast group (used to receive). A third handle,
//! `mio::Poll`, stands in for the source's `epoll` instance.

use std::io;
use std::net::{SocketAddrV4, UdpSocket as StdUdpSocket};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use mio::net::UdpSocket as MioUdpSocket;
use mio::{Events, Interest, Poll, Token};
use socket2::{Domain, Protocol, Socket, Type};

use crate::address::{MediumConfig, SocketAddress};
use crate::error::{RadioError, Result};

/// Block until a datagram arrives, with no timeout.
pub const WAIT_FOREVER: i32 = -1;
/// Return immediately if nothing is waiting.
pub const DONT_WAIT: i32 = 0;

const RX_TOKEN: Token = Token(0);

fn socket_addr_v4(addr: SocketAddress) -> SocketAddrV4 {
    SocketAddrV4::new(addr.to_ipv4_addr(), addr.port)
}

fn new_udp_socket() -> io::Result<Socket> {
    Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
}

fn init_tx_socket(config: &MediumConfig) -> Result<StdUdpSocket> {
    let socket = new_udp_socket()?;
    socket.set_multicast_if_v4(&config.interface_ipv4.into())?;
    socket.set_multicast_loop_v4(true)?;
    socket.bind(&socket_addr_v4(config.tx_addr).into())?;
    Ok(socket.into())
}

fn init_rx_socket(config: &MediumConfig) -> Result<MioUdpSocket> {
    let socket = new_udp_socket()?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.bind(&socket_addr_v4(config.rx_addr).into())?;
    socket.join_multicast_v4(&config.rx_addr.to_ipv4_addr(), &config.interface_ipv4.into())?;
    socket.set_nonblocking(true)?;

    let std_socket: StdUdpSocket = socket.into();
    Ok(MioUdpSocket::from_std(std_socket))
}

/// One datagram read off the medium.
#[derive(Debug, Clone, Copy, Default)]
pub struct Received {
    /// Number of bytes filled in the caller's buffer. Zero on timeout *and*
    /// on a self-echoed transmission — both are "nothing to process" from
    /// the caller's point of view.
    pub len: usize,
    /// The sender's address, unless this was our own transmission (in which
    /// case `len` is also zero and this is `None`) or nothing arrived.
    pub origin: Option<SocketAddress>,
}

impl Received {
    fn empty() -> Self {
        Self { len: 0, origin: None }
    }
}

type RxDoneCallback = Box<dyn FnMut(&[u8], SocketAddress) + Send>;

/// A multicast UDP endpoint standing in for a radio's RF medium.
pub struct MediumEndpoint {
    config: MediumConfig,
    tx_socket: StdUdpSocket,
    rx_socket: MioUdpSocket,
    poll: Poll,
    events: Events,
    rx_interrupt_enabled: bool,
    rx_done_callback: Option<RxDoneCallback>,
    rx_scratch: Vec<u8>,
}

impl MediumEndpoint {
    /// Join the multicast group and bind both sockets. Any socket setup
    /// failure here is the Rust equivalent of the source's fatal `assert` —
    /// it indicates a broken host environment, not a data error, so callers
    /// are expected to `.expect()` it rather than retry.
    pub fn init(config: MediumConfig) -> Result<Self> {
        let tx_socket = init_tx_socket(&config)?;
        let mut rx_socket = init_rx_socket(&config)?;

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut rx_socket, RX_TOKEN, Interest::READABLE)?;

        log::debug!(
            "medium: joined {}:{} via interface {} (tx identity {}:{})",
            config.rx_addr.to_ipv4_addr(),
            config.rx_addr.port,
            std::net::Ipv4Addr::from(config.interface_ipv4),
            config.tx_addr.to_ipv4_addr(),
            config.tx_addr.port,
        );

        Ok(Self {
            rx_scratch: vec![0u8; config.rx_buffer_capacity],
            config,
            tx_socket,
            rx_socket,
            poll,
            events: Events::with_capacity(1),
            rx_interrupt_enabled: false,
            rx_done_callback: None,
        })
    }

    /// Send one datagram to the multicast group. Returns the number of
    /// bytes written (equal to `buf.len()` for UDP, per `sendto` semantics).
    pub fn send_blocking(&self, buf: &[u8]) -> Result<usize> {
        let dest = socket_addr_v4(self.config.rx_addr);
        let sent = self.tx_socket.send_to(buf, dest)?;
        if sent != buf.len() {
            return Err(RadioError::ShortWrite {
                sent,
                expected: buf.len(),
            });
        }
        Ok(sent)
    }

    /// Receive one datagram, honoring `timeout_ms`: [`WAIT_FOREVER`] blocks
    /// until data arrives, [`DONT_WAIT`] polls once and returns immediately,
    /// any positive value bounds the wait. Datagrams that originated from
    /// this endpoint's own `tx_addr` are suppressed (`len == 0`, `origin ==
    /// None`) rather than delivered — this is how a sender avoids hearing
    /// its own transmissions.
    pub fn receive_blocking(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<Received> {
        let deadline = match timeout_ms {
            WAIT_FOREVER => None,
            ms if ms < 0 => None,
            0 => Some(Instant::now()),
            ms => Some(Instant::now() + Duration::from_millis(ms as u64)),
        };

        loop {
            let poll_timeout = match (timeout_ms, deadline) {
                (WAIT_FOREVER, _) => None,
                (0, _) => Some(Duration::from_secs(0)),
                (_, Some(deadline)) => Some(deadline.saturating_duration_since(Instant::now())),
                (_, None) => None,
            };

            self.poll.poll(&mut self.events, poll_timeout)?;

            if self.events.iter().any(|e| e.token() == RX_TOKEN) {
                match self.rx_socket.recv_from(buf) {
                    Ok((len, origin)) => {
                        return Ok(self.accept_or_suppress(len, origin));
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        // Spurious wakeup; fall through to the deadline check below.
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            if timeout_ms == 0 {
                return Ok(Received::empty());
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Ok(Received::empty());
                }
            }
        }
    }

    fn accept_or_suppress(&self, len: usize, origin: std::net::SocketAddr) -> Received {
        let origin = match origin {
            std::net::SocketAddr::V4(v4) => SocketAddress::new(u32::from(*v4.ip()), v4.port()),
            std::net::SocketAddr::V6(_) => unreachable!("medium is IPv4-only"),
        };

        if origin == self.config.tx_addr {
            Received::empty()
        } else {
            Received {
                len,
                origin: Some(origin),
            }
        }
    }

    /// Arm or disarm the interrupt-style delivery path used by
    /// [`Self::processing_loop`].
    pub fn enable_rx_interrupt(&mut self, state: bool) {
        self.rx_interrupt_enabled = state;
    }

    /// Install the callback invoked on every non-suppressed datagram, in
    /// interrupt (`processing_loop`) or worker-thread
    /// (`run_processing_thread`) mode.
    pub fn register_rx_done(&mut self, callback: impl FnMut(&[u8], SocketAddress) + Send + 'static) {
        self.rx_done_callback = Some(Box::new(callback));
    }

    /// One cooperative-tick step: if RX interrupt mode is armed, do a
    /// zero-timeout receive and, if a datagram arrived, invoke the
    /// registered callback. Call this repeatedly from the host's main loop.
    pub fn processing_loop(&mut self) -> Result<()> {
        if !self.rx_interrupt_enabled {
            return Ok(());
        }

        let mut buf = std::mem::take(&mut self.rx_scratch);
        let received = self.receive_blocking(&mut buf, DONT_WAIT);
        self.rx_scratch = buf;

        let received = received?;
        if received.len > 0 {
            if let (Some(callback), Some(origin)) =
                (self.rx_done_callback.as_mut(), received.origin)
            {
                callback(&self.rx_scratch[..received.len], origin);
            }
        }
        Ok(())
    }

    /// Spawn a worker thread that blocks forever on receive and invokes the
    /// registered callback on every non-suppressed datagram. Never joined —
    /// process teardown reclaims it, matching the source's detached
    /// `pthread_create`.
    pub fn run_processing_thread(mut self) -> JoinHandle<()> {
        thread::spawn(move || loop {
            let mut buf = std::mem::take(&mut self.rx_scratch);
            let result = self.receive_blocking(&mut buf, WAIT_FOREVER);
            self.rx_scratch = buf;

            match result {
                Ok(received) if received.len > 0 => {
                    if let (Some(callback), Some(origin)) =
                        (self.rx_done_callback.as_mut(), received.origin)
                    {
                        callback(&self.rx_scratch[..received.len], origin);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("medium processing thread: receive failed: {e}");
                    break;
                }
            }
        })
    }
}
