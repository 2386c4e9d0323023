//! # etbus_rs
//!
//! A Rust implementation of the device side of the ET-Bus smart-home
//! protocol: connectionless UDP datagrams carrying versioned JSON
//! envelopes between peripherals (switches, RGB lights, fan controllers)
//! and a central hub.
//!
//! The engine announces the device via multicast, learns the hub's
//! address from inbound `ping`/`command` traffic, keeps liveness with a
//! periodic `pong` heartbeat, and reports state on demand. There is no
//! connection setup, no retries and no acknowledgements: loss is accepted
//! and every failure is superseded by the next tick or heartbeat.
//!
//! ## Quick Start
//!
//! ```no_run
//! use etbus_rs::{DeviceIdentity, EtBus, StaticSignal, SystemClock, UdpTransport};
//!
//! fn main() -> Result<(), etbus_rs::TransportError> {
//!     let identity = DeviceIdentity::new("plug-01", "switch", "Desk Plug", "1.4.2");
//!     let mut bus = EtBus::new(
//!         identity,
//!         UdpTransport::new()?,
//!         SystemClock::new(),
//!         StaticSignal::new(-60),
//!     );
//!
//!     bus.on_command(|class, payload| {
//!         println!("command for {class}: {payload:?}");
//!     });
//!
//!     // Announce the device, then hand the engine one tick per loop.
//!     bus.start()?;
//!     loop {
//!         bus.poll();
//!         std::thread::sleep(std::time::Duration::from_millis(10));
//!     }
//! }
//! ```
//!
//! ## Design
//!
//! - **Single-threaded and cooperative**: the caller owns the run loop;
//!   [`EtBus::poll`] never blocks and never spawns threads.
//! - **Multicast until the hub is known, unicast after**: every outbound
//!   message goes through the same address policy, so a device converges
//!   to a reliable unicast path as soon as the hub speaks to it, while
//!   still tolerating hub address changes.
//! - **Nothing is fatal**: malformed datagrams are counted and dropped,
//!   unknown protocol versions are ignored, and transport hiccups are
//!   retried by the next scheduled message.
//!
//! ## Communication
//!
//! All traffic is UDP on port 5555. Devices join the multicast group
//! `239.10.0.1` at startup to hear hub broadcasts, and accept unicast
//! once the hub has learned their address from a `discover` or `pong`.

mod engine;
mod envelope;
mod errors;
mod heartbeat;
mod hub;
mod identity;
mod report;
mod transport;

// Re-export public API
pub use engine::{CommandHandler, EtBus};
pub use envelope::{Envelope, MAX_DATAGRAM_LEN, MessageType, PROTOCOL_VERSION, decode, encode};
pub use errors::{CodecError, TransportError};
pub use heartbeat::HeartbeatScheduler;
pub use hub::HubRecord;
pub use identity::DeviceIdentity;
pub use report::{FanState, RgbState, SwitchState};
pub use transport::{
    Clock, ETBUS_PORT, MULTICAST_GROUP, SignalSource, StaticSignal, SystemClock, Transport,
    UdpTransport, multicast_addr,
};
