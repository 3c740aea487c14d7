//! The node's own addresses, as last reported by the transport layer.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::address::PeerAddress;
use crate::selector::select_share_addresses;

/// Shared, cheaply clonable view of the addresses this node is reachable at.
///
/// The transport layer refreshes it opportunistically; everything else only
/// reads snapshots.
#[derive(Debug, Clone, Default)]
pub struct NodeAddressBook {
    addresses: Arc<RwLock<Vec<PeerAddress>>>,
}

impl NodeAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_addresses(addresses: impl IntoIterator<Item = PeerAddress>) -> Self {
        let book = Self::new();
        book.replace(addresses);
        book
    }

    /// Replace the full address list, dropping duplicates.
    pub fn replace(&self, addresses: impl IntoIterator<Item = PeerAddress>) {
        let mut unique: Vec<PeerAddress> = Vec::new();
        for address in addresses {
            if !unique.contains(&address) {
                unique.push(address);
            }
        }
        debug!(count = unique.len(), "node address book replaced");
        *self.addresses.write() = unique;
    }

    /// Record a newly observed address. Returns `false` if it was already known.
    pub fn insert(&self, address: PeerAddress) -> bool {
        let mut addresses = self.addresses.write();
        if addresses.contains(&address) {
            return false;
        }
        debug!(%address, "node address added");
        addresses.push(address);
        true
    }

    /// Forget an address that expired. Returns `false` if it was unknown.
    pub fn remove(&self, address: &PeerAddress) -> bool {
        let mut addresses = self.addresses.write();
        let before = addresses.len();
        addresses.retain(|known| known != address);
        before != addresses.len()
    }

    pub fn snapshot(&self) -> Vec<PeerAddress> {
        self.addresses.read().clone()
    }

    pub fn len(&self) -> usize {
        self.addresses.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.read().is_empty()
    }

    /// The prioritized subset that belongs in a share link.
    pub fn share_addresses(&self) -> Vec<PeerAddress> {
        select_share_addresses(&self.addresses.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_deduplicates_and_keeps_order() {
        let book = NodeAddressBook::from_addresses(
            ["/ip4/127.0.0.1/tcp/1", "/ip4/127.0.0.1/tcp/2", "/ip4/127.0.0.1/tcp/1"]
                .into_iter()
                .map(PeerAddress::from),
        );
        assert_eq!(
            book.snapshot(),
            vec![
                PeerAddress::from("/ip4/127.0.0.1/tcp/1"),
                PeerAddress::from("/ip4/127.0.0.1/tcp/2"),
            ]
        );
    }

    #[test]
    fn clones_share_the_same_view() {
        let book = NodeAddressBook::new();
        let reader = book.clone();
        assert!(reader.is_empty());

        assert!(book.insert(PeerAddress::from("/ip4/192.0.2.10/udp/4001/webrtc-direct")));
        assert!(!book.insert(PeerAddress::from("/ip4/192.0.2.10/udp/4001/webrtc-direct")));
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.share_addresses().len(), 1);

        assert!(book.remove(&PeerAddress::from("/ip4/192.0.2.10/udp/4001/webrtc-direct")));
        assert!(reader.share_addresses().is_empty());
    }
}
