//! Payload shaping for outbound `state` reports.
//!
//! These are pure convenience wrappers: each builds the device-specific
//! payload map that [`EtBus::send_state`] merges with identity fields and
//! hands to the address policy.
//!
//! [`EtBus::send_state`]: crate::EtBus::send_state

use serde::Serialize;
use serde_json::{Map, Value};

fn payload_of<T: Serialize>(report: &T) -> Map<String, Value> {
    match serde_json::to_value(report) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// State of a simple on/off switch.
///
/// # Examples
///
/// ```
/// use etbus_rs::SwitchState;
///
/// let payload = SwitchState::new(true).into_payload();
/// assert_eq!(payload["on"], serde_json::json!(true));
/// ```
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SwitchState {
    on: bool,
}

impl SwitchState {
    pub fn new(on: bool) -> Self {
        SwitchState { on }
    }

    pub fn into_payload(self) -> Map<String, Value> {
        payload_of(&self)
    }
}

/// State of an RGB light, optionally carrying an animation effect.
///
/// Effect and speed are opaque pass-through values for the hub; this
/// library does not render anything. An empty effect name and a zero
/// speed both mean "field omitted," not "effect none" / "speed zero".
///
/// # Examples
///
/// ```
/// use etbus_rs::RgbState;
///
/// let mut state = RgbState::new(true, 255, 64, 0, 200);
/// state.effect("rainbow");
/// state.speed(120);
///
/// let payload = state.into_payload();
/// assert_eq!(payload["effect"], serde_json::json!("rainbow"));
/// assert_eq!(payload["speed"], serde_json::json!(120));
/// ```
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct RgbState {
    on: bool,
    r: u8,
    g: u8,
    b: u8,
    brightness: u8,
    effect: Option<String>,
    speed: Option<u8>,
}

impl RgbState {
    pub fn new(on: bool, r: u8, g: u8, b: u8, brightness: u8) -> Self {
        RgbState {
            on,
            r,
            g,
            b,
            brightness,
            effect: None,
            speed: None,
        }
    }

    /// Set the effect name. An empty name leaves the field out entirely.
    pub fn effect(&mut self, effect: &str) {
        if !effect.is_empty() {
            self.effect = Some(effect.to_string());
        }
    }

    /// Set the effect speed. Zero leaves the field out entirely.
    pub fn speed(&mut self, speed: u8) {
        if speed > 0 {
            self.speed = Some(speed);
        }
    }

    pub fn into_payload(self) -> Map<String, Value> {
        payload_of(&self)
    }
}

/// State of a fan with named preset speeds.
///
/// # Examples
///
/// ```
/// use etbus_rs::FanState;
///
/// // An empty preset defaults by power state.
/// let payload = FanState::new(true, "").into_payload();
/// assert_eq!(payload["preset"], serde_json::json!("low"));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct FanState {
    on: bool,
    preset: String,
}

impl FanState {
    /// Build a fan state. When `preset` is empty it defaults to `"low"`
    /// while on and `"off"` while off.
    pub fn new(on: bool, preset: &str) -> Self {
        let preset = if preset.is_empty() {
            if on { "low" } else { "off" }
        } else {
            preset
        };
        FanState {
            on,
            preset: preset.to_string(),
        }
    }

    pub fn into_payload(self) -> Map<String, Value> {
        payload_of(&self)
    }
}
