use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Multicodec for bare file bytes.
pub const CODEC_RAW: u64 = 0x55;
/// Multicodec for directory nodes.
pub const CODEC_DAG_PB: u64 = 0x70;
/// Multihash code for SHA2-256 (the only hash allowed in v0 ids).
pub const MULTIHASH_SHA2_256: u64 = 0x12;
/// Multihash code for BLAKE3 (used by the in-memory store).
pub const MULTIHASH_BLAKE3: u64 = 0x1e;

/// Encoded length of a version 0 identifier (`Qm` + 44 base58 characters).
pub const CID_V0_LENGTH: usize = 46;

const MAX_VARINT_BYTES: usize = 9;

/// Errors that can occur when parsing a content identifier string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentIdError {
    #[error("content id is empty")]
    Empty,
    #[error("unsupported multibase prefix '{0}'")]
    UnsupportedMultibase(char),
    #[error("content id payload is not valid {encoding}")]
    InvalidEncoding { encoding: &'static str },
    #[error("unsupported content id version {0}")]
    UnsupportedVersion(u64),
    #[error("truncated varint in content id")]
    TruncatedVarint,
    #[error("multihash digest declares {declared} bytes, found {actual}")]
    DigestLength { declared: u64, actual: usize },
}

/// Immutable, content-derived identifier.
///
/// The textual form is a CID: either a version 0 base58 string starting with
/// `Qm`, or a version 1 multibase string (`b`/`B` base32, `k`/`K` base36,
/// `z` base58btc, `f` base16).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Parse and validate a textual content id.
    pub fn parse(value: &str) -> Result<Self, ContentIdError> {
        validate(value)?;
        Ok(Self(value.to_string()))
    }

    /// Wrap a string without validating it.
    ///
    /// Only for ids that come from a trusted store or that are shown to the
    /// user verbatim.
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Check whether the provided string is a valid content id.
    pub fn is_valid(value: &str) -> bool {
        validate(value).is_ok()
    }

    /// Build a version 1 id from a codec and an already computed digest.
    pub fn from_digest(codec: u64, multihash_code: u64, digest: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(digest.len() + 8);
        write_varint(1, &mut bytes);
        write_varint(codec, &mut bytes);
        write_varint(multihash_code, &mut bytes);
        write_varint(digest.len() as u64, &mut bytes);
        bytes.extend_from_slice(digest);

        let mut encoded = String::with_capacity(1 + bytes.len() * 8 / 5 + 1);
        encoded.push('b');
        encoded.push_str(&BASE32_NOPAD.encode(&bytes).to_ascii_lowercase());
        Self(encoded)
    }

    /// Hash `data` with BLAKE3 and wrap it as a version 1 id with `codec`.
    pub fn blake3(codec: u64, data: &[u8]) -> Self {
        let digest = blake3::hash(data);
        Self::from_digest(codec, MULTIHASH_BLAKE3, digest.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentId {
    type Err = ContentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentId {
    type Error = ContentIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value)?;
        Ok(Self(value))
    }
}

impl From<ContentId> for String {
    fn from(value: ContentId) -> Self {
        value.0
    }
}

fn validate(value: &str) -> Result<(), ContentIdError> {
    let Some(prefix) = value.chars().next() else {
        return Err(ContentIdError::Empty);
    };

    if value.len() == CID_V0_LENGTH && value.starts_with("Qm") {
        let bytes = bs58::decode(value)
            .into_vec()
            .map_err(|_| ContentIdError::InvalidEncoding {
                encoding: "base58btc",
            })?;
        return validate_multihash(&bytes);
    }

    let payload = &value[prefix.len_utf8()..];
    let bytes = match prefix {
        'b' => BASE32_NOPAD
            .decode(payload.to_ascii_uppercase().as_bytes())
            .map_err(|_| ContentIdError::InvalidEncoding { encoding: "base32" })?,
        'B' => BASE32_NOPAD
            .decode(payload.as_bytes())
            .map_err(|_| ContentIdError::InvalidEncoding { encoding: "base32" })?,
        'z' => bs58::decode(payload)
            .into_vec()
            .map_err(|_| ContentIdError::InvalidEncoding {
                encoding: "base58btc",
            })?,
        'k' | 'K' => decode_base36(payload)
            .ok_or(ContentIdError::InvalidEncoding { encoding: "base36" })?,
        'f' => hex::decode(payload)
            .map_err(|_| ContentIdError::InvalidEncoding { encoding: "base16" })?,
        other => return Err(ContentIdError::UnsupportedMultibase(other)),
    };

    let (version, rest) = read_varint(&bytes)?;
    if version != 1 {
        return Err(ContentIdError::UnsupportedVersion(version));
    }
    let (_codec, multihash) = read_varint(rest)?;
    validate_multihash(multihash)
}

/// Big-endian base36 decode; leading `0` digits become zero bytes.
fn decode_base36(payload: &str) -> Option<Vec<u8>> {
    let mut bytes: Vec<u8> = Vec::new();
    for ch in payload.chars() {
        let mut carry = ch.to_digit(36)?;
        for byte in bytes.iter_mut() {
            carry += u32::from(*byte) * 36;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    let zeros = payload.chars().take_while(|&ch| ch == '0').count();
    bytes.resize(bytes.len() + zeros, 0);
    bytes.reverse();
    Some(bytes)
}

fn validate_multihash(bytes: &[u8]) -> Result<(), ContentIdError> {
    let (_code, rest) = read_varint(bytes)?;
    let (declared, digest) = read_varint(rest)?;
    if declared == 0 || declared != digest.len() as u64 {
        return Err(ContentIdError::DigestLength {
            declared,
            actual: digest.len(),
        });
    }
    Ok(())
}

fn read_varint(bytes: &[u8]) -> Result<(u64, &[u8]), ContentIdError> {
    let mut value = 0u64;
    for (index, byte) in bytes.iter().enumerate().take(MAX_VARINT_BYTES) {
        value |= u64::from(byte & 0x7f) << (7 * index);
        if byte & 0x80 == 0 {
            return Ok((value, &bytes[index + 1..]));
        }
    }
    Err(ContentIdError::TruncatedVarint)
}

fn write_varint(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}
