//! Peer addresses as advertised by a node and carried inside share links.

use std::fmt;
use std::str::FromStr;

use libp2p::multiaddr::Protocol;
use libp2p::Multiaddr;
use serde::{Deserialize, Serialize};

/// Errors raised when an address string is not a valid multiaddr.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("invalid peer address '{address}': {source}")]
    Invalid {
        address: String,
        #[source]
        source: libp2p::multiaddr::Error,
    },
}

/// Transport category of a peer address, ordered by share priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressClass {
    /// WebRTC reachable without a relay hop.
    DirectRealtime,
    /// WebRTC Direct signalled through a circuit relay.
    RelayedRealtime,
    /// Circuit relay over a secure stream transport (WSS, TLS+WS, WebTransport).
    RelayedSecure,
    /// Anything a browser cannot use to reach us directly.
    Other,
}

impl AddressClass {
    /// Selection tier, `None` for addresses that are never shared.
    pub fn tier(self) -> Option<usize> {
        match self {
            AddressClass::DirectRealtime => Some(0),
            AddressClass::RelayedRealtime => Some(1),
            AddressClass::RelayedSecure => Some(2),
            AddressClass::Other => None,
        }
    }
}

impl fmt::Display for AddressClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            AddressClass::DirectRealtime => "direct-realtime",
            AddressClass::RelayedRealtime => "relayed-realtime",
            AddressClass::RelayedSecure => "relayed-secure",
            AddressClass::Other => "other",
        };
        f.write_str(value)
    }
}

/// Opaque, serializable network address string.
///
/// The string is kept verbatim so that share links round-trip exactly; it is
/// only parsed into a [`Multiaddr`] for classification or dialing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerAddress(String);

impl PeerAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into a structured multiaddr.
    pub fn to_multiaddr(&self) -> Result<Multiaddr, AddressError> {
        Multiaddr::from_str(&self.0).map_err(|source| AddressError::Invalid {
            address: self.0.clone(),
            source,
        })
    }

    /// Classify the address; unparsable strings are [`AddressClass::Other`].
    pub fn class(&self) -> AddressClass {
        self.to_multiaddr()
            .map(|addr| classify(&addr))
            .unwrap_or(AddressClass::Other)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PeerAddress {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&Multiaddr> for PeerAddress {
    fn from(value: &Multiaddr) -> Self {
        Self(value.to_string())
    }
}

impl From<Multiaddr> for PeerAddress {
    fn from(value: Multiaddr) -> Self {
        Self::from(&value)
    }
}

/// Classify a multiaddr by walking its protocol stack.
///
/// A relayed address only counts as realtime when it carries WebRTC Direct;
/// relayed plain WebRTC is not shared at all.
pub fn classify(addr: &Multiaddr) -> AddressClass {
    let mut relayed = false;
    let mut webrtc = false;
    let mut webrtc_direct = false;
    let mut secure = false;
    let mut tls = false;

    for protocol in addr.iter() {
        match protocol {
            Protocol::P2pCircuit => relayed = true,
            Protocol::WebRTC => webrtc = true,
            Protocol::WebRTCDirect => webrtc_direct = true,
            Protocol::Wss(_) | Protocol::WebTransport => secure = true,
            Protocol::Tls => tls = true,
            Protocol::Ws(_) if tls => secure = true,
            _ => {}
        }
    }

    if !relayed {
        return if webrtc || webrtc_direct {
            AddressClass::DirectRealtime
        } else {
            AddressClass::Other
        };
    }

    match (webrtc_direct, webrtc, secure) {
        (true, _, _) => AddressClass::RelayedRealtime,
        (false, false, true) => AddressClass::RelayedSecure,
        _ => AddressClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_of(address: &str) -> AddressClass {
        PeerAddress::from(address).class()
    }

    #[test]
    fn direct_webrtc_addresses() {
        assert_eq!(
            class_of("/ip4/192.0.2.10/udp/4001/webrtc-direct"),
            AddressClass::DirectRealtime
        );
        assert_eq!(
            class_of("/ip6/2001:db8::1/udp/4001/webrtc-direct"),
            AddressClass::DirectRealtime
        );
    }

    #[test]
    fn relayed_webrtc_addresses() {
        assert_eq!(
            class_of("/dns4/relay.example.com/udp/4001/webrtc-direct/p2p-circuit"),
            AddressClass::RelayedRealtime
        );
        // Relayed plain WebRTC is neither realtime nor a secure transport.
        assert_eq!(
            class_of("/dns4/relay.example.com/tcp/443/wss/p2p-circuit/webrtc"),
            AddressClass::Other
        );
    }

    #[test]
    fn relayed_secure_transports() {
        assert_eq!(
            class_of("/dns4/relay.example.com/tcp/443/wss/p2p-circuit"),
            AddressClass::RelayedSecure
        );
        assert_eq!(
            class_of("/dns4/relay.example.com/tcp/443/tls/ws/p2p-circuit"),
            AddressClass::RelayedSecure
        );
        assert_eq!(
            class_of("/ip4/192.0.2.1/udp/4001/quic-v1/webtransport/p2p-circuit"),
            AddressClass::RelayedSecure
        );
    }

    #[test]
    fn everything_else_is_other() {
        assert_eq!(class_of("/ip4/127.0.0.1/tcp/4001"), AddressClass::Other);
        assert_eq!(class_of("/ip4/127.0.0.1/tcp/4001/ws"), AddressClass::Other);
        // Plain WS through a relay is not a secure transport.
        assert_eq!(
            class_of("/ip4/192.0.2.1/tcp/80/ws/p2p-circuit"),
            AddressClass::Other
        );
        assert_eq!(class_of("not a multiaddr"), AddressClass::Other);
    }

    #[test]
    fn invalid_address_reports_source() {
        let err = PeerAddress::from("/ip4/999.1.1.1/tcp/1")
            .to_multiaddr()
            .expect_err("octet out of range");
        assert!(err.to_string().contains("/ip4/999.1.1.1/tcp/1"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let address = PeerAddress::from("/ip4/192.0.2.10/udp/4001/webrtc-direct");
        let json = serde_json::to_string(&address).expect("serialize");
        assert_eq!(json, "\"/ip4/192.0.2.10/udp/4001/webrtc-direct\"");
    }

    #[test]
    fn tiers_follow_priority() {
        assert!(AddressClass::DirectRealtime.tier() < AddressClass::RelayedRealtime.tier());
        assert!(AddressClass::RelayedRealtime.tier() < AddressClass::RelayedSecure.tier());
        assert_eq!(AddressClass::Other.tier(), None);
    }
}
