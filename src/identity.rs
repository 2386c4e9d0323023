//! Immutable device identity.

use serde::{Deserialize, Serialize};

/// Identity of the device running the protocol engine.
///
/// Set once at startup and read-only thereafter; every outbound envelope
/// stamps these fields so the hub can attribute traffic without any
/// per-device configuration on its side.
///
/// # Example
///
/// ```
/// use etbus_rs::DeviceIdentity;
///
/// let identity = DeviceIdentity::new("plug-01", "switch", "Desk Plug", "1.4.2");
/// assert_eq!(identity.class(), "switch");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceIdentity {
    id: String,
    class: String,
    name: String,
    firmware_version: String,
}

impl DeviceIdentity {
    pub fn new(id: &str, class: &str, name: &str, firmware_version: &str) -> Self {
        DeviceIdentity {
            id: id.to_string(),
            class: class.to_string(),
            name: name.to_string(),
            firmware_version: firmware_version.to_string(),
        }
    }

    /// Opaque device id, unique on the bus.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Device-type tag, e.g. `"switch"`, `"rgb"`, `"fan"`.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Human-friendly label shown by the hub.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn firmware_version(&self) -> &str {
        &self.firmware_version
    }
}
