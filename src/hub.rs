//! Hub address learning and outbound destination selection.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::envelope::MessageType;
use crate::transport::multicast_addr;

/// Where the hub lives, as far as this device knows.
///
/// The binding only ever strengthens: it starts unknown, becomes known on
/// the first hub-originated message, and from then on can move to a new
/// address (hub restart, DHCP lease change) but never reverts to unknown.
/// That keeps outbound traffic from oscillating between multicast and
/// unicast once a working unicast path exists.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HubRecord {
    known: bool,
    address: Option<SocketAddr>,
}

impl HubRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn known(&self) -> bool {
        self.known
    }

    /// The learned hub address. Meaningful only while [`known`] is true.
    ///
    /// [`known`]: HubRecord::known
    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }

    /// Feed one successfully decoded inbound message into the locator.
    ///
    /// Only `ping` and `command` count as hub evidence. Returns true when
    /// the record changed (first learn or address update) so the caller
    /// can log the event.
    pub fn observe(&mut self, sender: SocketAddr, kind: MessageType) -> bool {
        if !kind.is_hub_evidence() {
            return false;
        }
        if !self.known || self.address != Some(sender) {
            self.known = true;
            self.address = Some(sender);
            return true;
        }
        false
    }

    /// Select the destination for one outbound message.
    ///
    /// Unicast to the hub once known, regardless of the flag; otherwise
    /// the well-known multicast group when `allow_multicast_fallback` is
    /// set; otherwise `None`, meaning the send is suppressed.
    pub fn destination(&self, allow_multicast_fallback: bool) -> Option<SocketAddr> {
        match self.address {
            Some(addr) if self.known => Some(addr),
            _ if allow_multicast_fallback => Some(multicast_addr()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> SocketAddr {
        format!("192.168.1.{last}:5555").parse().unwrap()
    }

    #[test]
    fn test_learns_from_ping_and_command_only() {
        for kind in [MessageType::Ping, MessageType::Command] {
            let mut hub = HubRecord::new();
            assert!(hub.observe(addr(10), kind));
            assert!(hub.known());
            assert_eq!(hub.address(), Some(addr(10)));
        }

        for kind in [
            MessageType::Discover,
            MessageType::Pong,
            MessageType::State,
            MessageType::Unknown,
        ] {
            let mut hub = HubRecord::new();
            assert!(!hub.observe(addr(10), kind));
            assert!(!hub.known());
            assert_eq!(hub.address(), None);
        }
    }

    #[test]
    fn test_known_is_monotonic_across_updates() {
        let mut hub = HubRecord::new();
        assert!(hub.observe(addr(10), MessageType::Ping));

        // Same sender again: no change.
        assert!(!hub.observe(addr(10), MessageType::Command));
        // Hub moved: address updates, still known.
        assert!(hub.observe(addr(20), MessageType::Ping));
        assert!(hub.known());
        assert_eq!(hub.address(), Some(addr(20)));
        // Non-evidence traffic never unlearns.
        assert!(!hub.observe(addr(30), MessageType::State));
        assert_eq!(hub.address(), Some(addr(20)));
    }

    #[test]
    fn test_destination_prefers_unicast_once_known() {
        let mut hub = HubRecord::new();
        assert_eq!(hub.destination(true), Some(multicast_addr()));
        assert_eq!(hub.destination(false), None);

        hub.observe(addr(10), MessageType::Command);
        assert_eq!(hub.destination(true), Some(addr(10)));
        // The fallback flag is irrelevant once the hub is known.
        assert_eq!(hub.destination(false), Some(addr(10)));
    }
}
