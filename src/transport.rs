//! Collaborator seams (transport, clock, signal strength) and their
//! std-based implementations.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Instant;

use log::debug;

use crate::errors::TransportError;

/// Multicast group shared by every device and the hub.
pub const MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 10, 0, 1);

/// UDP port shared by every device and the hub.
pub const ETBUS_PORT: u16 = 5555;

/// The well-known multicast destination used until a hub is learned.
pub fn multicast_addr() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(MULTICAST_GROUP, ETBUS_PORT))
}

/// Datagram transport as the engine sees it.
///
/// `recv` must be non-blocking: the dispatch loop is a cooperative tick
/// and may never stall waiting for traffic.
pub trait Transport {
    /// Poll for at most one pending datagram, returning it together with
    /// its source address, or `None` immediately when nothing is pending.
    fn recv(&mut self) -> Result<Option<(Vec<u8>, SocketAddr)>, TransportError>;

    /// Send one datagram to `dest`, best effort.
    fn send(&mut self, dest: SocketAddr, bytes: &[u8]) -> Result<(), TransportError>;

    /// Request stable datagram delivery from the underlying link, e.g.
    /// disabling WiFi power save on radio transports. Called once at
    /// startup, never on the message hot path.
    fn set_low_latency(&mut self, _on: bool) {}
}

/// Monotonic time source. The millisecond counter is allowed to wrap;
/// everything downstream uses wrapping arithmetic.
pub trait Clock {
    fn monotonic_millis(&self) -> u32;

    /// Whole seconds since the device came up, reported in heartbeats.
    fn uptime_seconds(&self) -> u32;
}

/// Source of the link signal-strength figure embedded in heartbeats.
pub trait SignalSource {
    fn rssi(&self) -> i32;
}

// One byte past the codec bound, so an oversized datagram arrives
// detectably long instead of silently truncated to a valid length.
const RECV_BUF_LEN: usize = crate::envelope::MAX_DATAGRAM_LEN + 1;

/// [`Transport`] over a std UDP socket bound to the bus port and joined
/// to the multicast group, in non-blocking mode.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    buffer: Box<[u8; RECV_BUF_LEN]>,
}

impl UdpTransport {
    /// Bind to the bus port on all interfaces and join the multicast
    /// group so hub broadcasts are received alongside unicast traffic.
    pub fn new() -> Result<Self, TransportError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, ETBUS_PORT))
            .map_err(|e| TransportError::socket("bind", e))?;
        socket
            .join_multicast_v4(&MULTICAST_GROUP, &Ipv4Addr::UNSPECIFIED)
            .map_err(|e| TransportError::socket("join_multicast_v4", e))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| TransportError::socket("set_nonblocking", e))?;

        Ok(UdpTransport {
            socket,
            buffer: Box::new([0u8; RECV_BUF_LEN]),
        })
    }
}

impl Transport for UdpTransport {
    fn recv(&mut self) -> Result<Option<(Vec<u8>, SocketAddr)>, TransportError> {
        match self.socket.recv_from(&mut self.buffer[..]) {
            Ok((size, addr)) => Ok(Some((self.buffer[..size].to_vec(), addr))),
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(TransportError::socket("recv_from", e)),
        }
    }

    fn send(&mut self, dest: SocketAddr, bytes: &[u8]) -> Result<(), TransportError> {
        let written = self
            .socket
            .send_to(bytes, dest)
            .map_err(|e| TransportError::socket("send_to", e))?;
        if written != bytes.len() {
            return Err(TransportError::ShortSend {
                dest,
                written,
                len: bytes.len(),
            });
        }
        Ok(())
    }

    fn set_low_latency(&mut self, on: bool) {
        // Nothing to toggle on a wired std socket; radio transports
        // override this to disable link power save.
        debug!("low latency mode requested: {on}");
    }
}

/// [`Clock`] backed by [`std::time::Instant`], anchored at construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn monotonic_millis(&self) -> u32 {
        // Deliberate truncation: wrapping is part of the contract.
        self.start.elapsed().as_millis() as u32
    }

    fn uptime_seconds(&self) -> u32 {
        self.start.elapsed().as_secs() as u32
    }
}

/// [`SignalSource`] reporting a fixed value, for hosts without a radio.
#[derive(Debug, Clone, Copy)]
pub struct StaticSignal {
    rssi: i32,
}

impl StaticSignal {
    pub fn new(rssi: i32) -> Self {
        StaticSignal { rssi }
    }
}

impl SignalSource for StaticSignal {
    fn rssi(&self) -> i32 {
        self.rssi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multicast_addr_constants() {
        let addr = multicast_addr();
        assert_eq!(addr.port(), ETBUS_PORT);
        assert_eq!(addr.ip().to_string(), "239.10.0.1");
        assert!(MULTICAST_GROUP.is_multicast());
    }

    #[test]
    fn test_static_signal() {
        assert_eq!(StaticSignal::new(-61).rssi(), -61);
    }
}
