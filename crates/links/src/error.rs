use thiserror::Error;

/// Failures while decoding the pieces of a link.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("link has no content id")]
    MissingContentId,

    #[error("address payload is not valid percent-encoded UTF-8")]
    PercentDecoding,

    #[error("address payload could not be decompressed")]
    Decompression,

    #[error("decompressed address payload is not valid UTF-16")]
    Utf16,
}

pub type Result<T> = std::result::Result<T, LinkError>;
