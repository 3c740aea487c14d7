//! Peer addressing for SnipShare.
//!
//! A node knows many of its own network addresses (TCP, QUIC, WebRTC, relay
//! circuits...). Only a couple of them are useful to a browser that opens a
//! share link, so this crate classifies addresses by transport and selects
//! a short, prioritized list for embedding in links.

pub mod address;
pub mod book;
pub mod selector;

pub use address::{classify, AddressClass, AddressError, PeerAddress};
pub use book::NodeAddressBook;
pub use libp2p::Multiaddr;
pub use selector::{select_share_addresses, MAX_SHARE_ADDRESSES};
