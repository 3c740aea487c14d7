//! Picks the peer addresses that go into a share link.
//!
//! Share links should stay short, so only [`MAX_SHARE_ADDRESSES`] addresses
//! are kept, preferring the transports most likely to let two browsers
//! connect directly.

use crate::address::PeerAddress;

/// Upper bound on the number of addresses embedded in a share link.
pub const MAX_SHARE_ADDRESSES: usize = 2;

const TIERS: usize = 3;

/// Select up to [`MAX_SHARE_ADDRESSES`] addresses, highest tier first.
///
/// Within a tier the input order is preserved. Addresses that do not parse or
/// belong to no tier are dropped.
pub fn select_share_addresses(addresses: &[PeerAddress]) -> Vec<PeerAddress> {
    let mut tiers: [Vec<&PeerAddress>; TIERS] = Default::default();
    for address in addresses {
        if let Some(tier) = address.class().tier() {
            tiers[tier].push(address);
        }
    }

    tiers
        .into_iter()
        .flatten()
        .take(MAX_SHARE_ADDRESSES)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECT_A: &str = "/ip4/192.0.2.10/udp/4001/webrtc-direct";
    const DIRECT_B: &str = "/ip4/192.0.2.11/udp/4002/webrtc-direct";
    const RELAYED_RTC: &str = "/dns4/relay.example.com/udp/4001/webrtc-direct/p2p-circuit";
    const RELAYED_PLAIN_RTC: &str = "/dns4/relay.example.com/tcp/443/wss/p2p-circuit/webrtc";
    const RELAYED_WSS_B: &str = "/dns4/relay2.example.com/tcp/443/wss/p2p-circuit";
    const RELAYED_WSS: &str = "/dns4/relay.example.com/tcp/443/wss/p2p-circuit";
    const PLAIN_TCP: &str = "/ip4/127.0.0.1/tcp/4001";

    fn addrs(values: &[&str]) -> Vec<PeerAddress> {
        values.iter().copied().map(PeerAddress::from).collect()
    }

    #[test]
    fn keeps_two_direct_addresses_over_relayed_secure() {
        let selected = select_share_addresses(&addrs(&[RELAYED_WSS, DIRECT_A, DIRECT_B]));
        assert_eq!(selected, addrs(&[DIRECT_A, DIRECT_B]));
    }

    #[test]
    fn fills_from_lower_tiers_in_order() {
        let selected = select_share_addresses(&addrs(&[RELAYED_WSS, PLAIN_TCP, RELAYED_RTC]));
        assert_eq!(selected, addrs(&[RELAYED_RTC, RELAYED_WSS]));

        let selected = select_share_addresses(&addrs(&[RELAYED_WSS, DIRECT_A]));
        assert_eq!(selected, addrs(&[DIRECT_A, RELAYED_WSS]));
    }

    #[test]
    fn relayed_plain_webrtc_does_not_displace_secure_relays() {
        let selected =
            select_share_addresses(&addrs(&[RELAYED_WSS, RELAYED_PLAIN_RTC, RELAYED_WSS_B]));
        assert_eq!(selected, addrs(&[RELAYED_WSS, RELAYED_WSS_B]));
    }

    #[test]
    fn drops_unusable_addresses() {
        assert!(select_share_addresses(&addrs(&[PLAIN_TCP, "garbage"])).is_empty());
        assert!(select_share_addresses(&[]).is_empty());
    }
}
