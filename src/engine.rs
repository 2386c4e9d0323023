//! The protocol engine: dispatch loop, heartbeat, and send helpers.

use std::net::SocketAddr;

use log::{debug, info};
use serde_json::{Map, Value};

use crate::envelope::{self, MessageType};
use crate::errors::{CodecError, TransportError};
use crate::heartbeat::HeartbeatScheduler;
use crate::hub::HubRecord;
use crate::identity::DeviceIdentity;
use crate::report::{FanState, RgbState, SwitchState};
use crate::transport::{Clock, SignalSource, Transport};

/// Handler invoked synchronously for each received `command` envelope,
/// with the envelope's device class and payload. At most one handler is
/// registered at a time; registering another replaces it wholesale.
pub type CommandHandler = Box<dyn FnMut(&str, &Map<String, Value>)>;

/// A device-side ET-Bus protocol engine.
///
/// One instance per device. The caller owns the run loop and drives the
/// engine by calling [`poll`] repeatedly; the engine never spawns threads
/// and never blocks, so `poll` can share a loop with whatever else the
/// device does.
///
/// ```no_run
/// use etbus_rs::{DeviceIdentity, EtBus, StaticSignal, SystemClock, UdpTransport};
///
/// let identity = DeviceIdentity::new("plug-01", "switch", "Desk Plug", "1.4.2");
/// let transport = UdpTransport::new()?;
/// let mut bus = EtBus::new(identity, transport, SystemClock::new(), StaticSignal::new(-60));
///
/// bus.on_command(|class, payload| {
///     println!("command for {class}: {payload:?}");
/// });
/// bus.start()?;
///
/// loop {
///     bus.poll();
///     std::thread::sleep(std::time::Duration::from_millis(10));
/// }
/// # Ok::<(), etbus_rs::TransportError>(())
/// ```
///
/// [`poll`]: EtBus::poll
pub struct EtBus {
    identity: DeviceIdentity,
    transport: Box<dyn Transport>,
    clock: Box<dyn Clock>,
    signal: Box<dyn SignalSource>,
    hub: HubRecord,
    heartbeat: HeartbeatScheduler,
    handler: Option<CommandHandler>,
    decode_failures: u64,
}

impl EtBus {
    pub fn new(
        identity: DeviceIdentity,
        transport: impl Transport + 'static,
        clock: impl Clock + 'static,
        signal: impl SignalSource + 'static,
    ) -> Self {
        let now = clock.monotonic_millis();
        EtBus {
            identity,
            transport: Box::new(transport),
            clock: Box::new(clock),
            signal: Box::new(signal),
            hub: HubRecord::new(),
            heartbeat: HeartbeatScheduler::new(now),
            handler: None,
            decode_failures: 0,
        }
    }

    /// Announce the device on the bus.
    ///
    /// Requests low-latency delivery from the transport, then sends one
    /// multicast `discover` (so the hub learns the device address
    /// immediately) and one `pong`, and baselines the heartbeat.
    pub fn start(&mut self) -> Result<(), TransportError> {
        self.transport.set_low_latency(true);
        self.send_discover()?;
        self.send_pong()?;
        self.heartbeat.rebase(self.clock.monotonic_millis());
        Ok(())
    }

    /// Register the command handler, replacing any previous one.
    pub fn on_command<F>(&mut self, handler: F)
    where
        F: FnMut(&str, &Map<String, Value>) + 'static,
    {
        self.handler = Some(Box::new(handler));
    }

    /// Run one cooperative tick: drain at most one inbound datagram, then
    /// check the heartbeat.
    ///
    /// Every failure on this path is non-fatal. Unreadable or malformed
    /// datagrams are dropped, and a failed heartbeat send is retried at
    /// the next scheduled firing.
    pub fn poll(&mut self) {
        match self.transport.recv() {
            Ok(Some((bytes, sender))) => self.dispatch(&bytes, sender),
            Ok(None) => {}
            Err(err) => debug!("transport receive failed: {err}"),
        }

        let now = self.clock.monotonic_millis();
        if self.heartbeat.tick(now) {
            if let Err(err) = self.send_pong() {
                debug!("heartbeat send failed, retrying next interval: {err}");
            }
        }
    }

    fn dispatch(&mut self, bytes: &[u8], sender: SocketAddr) {
        let env = match envelope::decode(bytes) {
            Ok(env) => env,
            Err(CodecError::UnsupportedVersion(v)) => {
                debug!("ignoring version {v} envelope from {sender}");
                return;
            }
            Err(err) => {
                self.decode_failures += 1;
                debug!(
                    "dropping datagram from {sender}: {err} ({} dropped so far)",
                    self.decode_failures
                );
                return;
            }
        };

        if self.hub.observe(sender, env.kind) {
            info!("learned hub address from {}: {sender}", env.kind);
        }

        if env.kind == MessageType::Command
            && let Some(handler) = self.handler.as_mut()
        {
            handler(&env.class, &env.payload);
        }
    }

    /// Send a multicast `discover` announcement.
    pub fn send_discover(&mut self) -> Result<(), TransportError> {
        self.send_envelope(MessageType::Discover, &Map::new(), true)
    }

    /// Send a `pong` heartbeat carrying uptime and signal strength.
    pub fn send_pong(&mut self) -> Result<(), TransportError> {
        let mut payload = Map::new();
        payload.insert(
            "uptime".to_string(),
            Value::from(self.clock.uptime_seconds()),
        );
        payload.insert("rssi".to_string(), Value::from(self.signal.rssi()));
        self.send_envelope(MessageType::Pong, &payload, true)
    }

    /// Send a `state` report with the given device-specific payload.
    pub fn send_state(&mut self, payload: &Map<String, Value>) -> Result<(), TransportError> {
        self.send_state_with(payload, true)
    }

    /// Send a `state` report with an explicit multicast-fallback policy.
    ///
    /// Passing `false` suppresses the send entirely while no hub is
    /// known, for deployments that want unicast-only reporting.
    pub fn send_state_with(
        &mut self,
        payload: &Map<String, Value>,
        allow_multicast_fallback: bool,
    ) -> Result<(), TransportError> {
        self.send_envelope(MessageType::State, payload, allow_multicast_fallback)
    }

    /// Report an on/off switch state.
    pub fn send_switch_state(&mut self, on: bool) -> Result<(), TransportError> {
        self.send_state(&SwitchState::new(on).into_payload())
    }

    /// Report an RGB light state with no effect.
    pub fn send_rgb_state(
        &mut self,
        on: bool,
        r: u8,
        g: u8,
        b: u8,
        brightness: u8,
    ) -> Result<(), TransportError> {
        self.send_rgb_state_fx(on, r, g, b, brightness, "", 0)
    }

    /// Report an RGB light state with an animation effect.
    ///
    /// An empty `effect` or zero `speed` leaves that field out of the
    /// payload; see [`RgbState`].
    #[allow(clippy::too_many_arguments)]
    pub fn send_rgb_state_fx(
        &mut self,
        on: bool,
        r: u8,
        g: u8,
        b: u8,
        brightness: u8,
        effect: &str,
        speed: u8,
    ) -> Result<(), TransportError> {
        let mut state = RgbState::new(on, r, g, b, brightness);
        state.effect(effect);
        state.speed(speed);
        self.send_state(&state.into_payload())
    }

    /// Report a fan state. An empty `preset` defaults by power state;
    /// see [`FanState`].
    pub fn send_fan_state(&mut self, on: bool, preset: &str) -> Result<(), TransportError> {
        self.send_state(&FanState::new(on, preset).into_payload())
    }

    fn send_envelope(
        &mut self,
        kind: MessageType,
        payload: &Map<String, Value>,
        allow_multicast_fallback: bool,
    ) -> Result<(), TransportError> {
        // Address policy: unicast once the hub is known, multicast only
        // as a fallback, otherwise the send is suppressed.
        let Some(dest) = self.hub.destination(allow_multicast_fallback) else {
            return Ok(());
        };
        let bytes = envelope::encode(kind, &self.identity, payload)?;
        self.transport.send(dest, &bytes)
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Current hub knowledge, for diagnostics.
    pub fn hub(&self) -> &HubRecord {
        &self.hub
    }

    /// Count of inbound datagrams dropped as malformed.
    pub fn decode_failures(&self) -> u64 {
        self.decode_failures
    }
}
