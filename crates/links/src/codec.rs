//! Share links: a content id plus a short list of peer addresses.
//!
//! Links look like `#/<contentId>?m=<payload>`, where the payload is the
//! comma-joined address list compressed with LZ-string's URI-safe alphabet.
//! Older links carried the list uncompressed as `?maddrs=a,b` (percent
//! encoded); those are still decoded but never produced.

use lz_str::{compress_to_encoded_uri_component, decompress_from_encoded_uri_component};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use snipshare_p2p::{select_share_addresses, NodeAddressBook, PeerAddress};
use snipshare_types::ContentId;
use tracing::warn;
use url::Url;

use crate::error::{LinkError, Result};
use crate::location::Location;

/// Query key of the compressed address list.
pub const COMPRESSED_ADDRESSES_PARAM: &str = "m";
/// Query key of the legacy, uncompressed address list.
pub const LEGACY_ADDRESSES_PARAM: &str = "maddrs";

const ADDRESS_SEPARATOR: &str = ",";

/// Alphabet of LZ-string's URI-safe output.
fn is_payload_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '$')
}

/// Characters escaped in a fragment query value.
const FRAGMENT_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'%')
    .add(b'&');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub content_id: ContentId,
    pub addresses: Vec<PeerAddress>,
}

impl ShareLink {
    /// A link carrying exactly `addresses`.
    pub fn new(content_id: ContentId, addresses: Vec<PeerAddress>) -> Self {
        Self {
            content_id,
            addresses,
        }
    }

    /// A link carrying the best of `addresses` (at most two).
    pub fn with_selected(content_id: ContentId, addresses: &[PeerAddress]) -> Self {
        Self::new(content_id, select_share_addresses(addresses))
    }

    /// A link carrying the node's current best addresses.
    pub fn for_node(content_id: ContentId, book: &NodeAddressBook) -> Self {
        Self::new(content_id, book.share_addresses())
    }

    /// Fragment form, `#` included.
    pub fn to_fragment(&self) -> String {
        let mut fragment = format!("#/{}", self.content_id);
        if !self.addresses.is_empty() {
            let joined = self
                .addresses
                .iter()
                .map(PeerAddress::as_str)
                .collect::<Vec<_>>()
                .join(ADDRESS_SEPARATOR);
            let compressed = compress_to_encoded_uri_component(joined.as_str());
            fragment.push_str(&format!(
                "?{COMPRESSED_ADDRESSES_PARAM}={}",
                utf8_percent_encode(&compressed, FRAGMENT_VALUE)
            ));
        }
        fragment
    }

    /// Absolute link under `base`; any fragment on `base` is replaced.
    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        let fragment = self.to_fragment();
        url.set_fragment(Some(&fragment[1..]));
        url
    }
}

/// Decode a share link given as a URL, a fragment or a bare route.
///
/// The content id token is returned as written; whether it names valid
/// content is decided by route classification.
pub fn decode_share_link(input: &str) -> Result<ShareLink> {
    let location = Location::parse(input);
    let token = location.token().ok_or(LinkError::MissingContentId)?;
    Ok(ShareLink::new(
        ContentId::new_unchecked(token),
        decode_addresses(&location),
    ))
}

/// Addresses carried by a location, empty when there are none.
///
/// The compressed form wins when present; if it cannot be decoded the link
/// is treated as carrying no addresses and the legacy form is not consulted.
pub fn decode_addresses(location: &Location<'_>) -> Vec<PeerAddress> {
    let joined = if let Some(payload) = location.param(COMPRESSED_ADDRESSES_PARAM) {
        match decompress_addresses(payload) {
            Ok(joined) => joined,
            Err(err) => {
                warn!(error = %err, "ignoring undecodable address payload");
                return Vec::new();
            }
        }
    } else if let Some(payload) = location.param(LEGACY_ADDRESSES_PARAM) {
        percent_decode_str(payload).decode_utf8_lossy().into_owned()
    } else {
        return Vec::new();
    };

    split_addresses(&joined)
}

/// Undo the `m=` encoding: percent escapes, then LZ-string decompression.
pub fn decompress_addresses(payload: &str) -> Result<String> {
    let unescaped = percent_decode_str(payload)
        .decode_utf8()
        .map_err(|_| LinkError::PercentDecoding)?;
    // Query parsers may have turned '+' into ' '.
    let restored = unescaped.replace(' ', "+");
    if restored.is_empty() || !restored.chars().all(is_payload_char) {
        return Err(LinkError::Decompression);
    }
    let wide = decompress_from_encoded_uri_component(restored.as_str())
        .ok_or(LinkError::Decompression)?;
    String::from_utf16(&wide).map_err(|_| LinkError::Utf16)
}

fn split_addresses(joined: &str) -> Vec<PeerAddress> {
    joined
        .split(ADDRESS_SEPARATOR)
        .filter(|address| !address.is_empty())
        .map(PeerAddress::from)
        .collect()
}
