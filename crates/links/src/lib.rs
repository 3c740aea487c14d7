//! Links and routes for SnipShare.
//!
//! Everything here operates on hash-routed locations: share links that
//! carry a content id plus peer addresses, edit links that prefill the add
//! form, and the route classification that turns an opened link into a
//! retrieval.

pub mod codec;
pub mod error;
pub mod location;
pub mod prefill;
pub mod route;

pub use codec::{
    decode_addresses, decode_share_link, decompress_addresses, ShareLink,
    COMPRESSED_ADDRESSES_PARAM, LEGACY_ADDRESSES_PARAM,
};
pub use error::{LinkError, Result};
pub use location::Location;
pub use prefill::{decode_prefill, edit_link, AddPrefill};
pub use route::{classify, Route, RouteStateMachine};
