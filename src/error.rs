use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Base64 decode failed: {0}")]
    Base64Decode(String),

    #[error("UTF-8 decode failed: {0}")]
    Utf8Decode(String),

    #[error("ASN.1 parse failed at offset {offset}: {reason}")]
    Asn1Parse { offset: usize, reason: &'static str },

    #[error("PEM parse failed: {0}")]
    PemParse(&'static str),

    #[error("Malformed SEM message: {0}")]
    SemParse(&'static str),

    #[error("Unsupported SEM version: {0}")]
    SemUnsupportedVersion(u8),

    #[error("SEM message authentication failed")]
    SemAuthentication,

    #[error("Invalid parameter: {0}")]
    Param(&'static str),

    #[error("Buffer too small: need {need} bytes, have {have}")]
    BufferTooSmall { need: usize, have: usize },

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Not available: {0}")]
    NotAvailable(&'static str),

    #[error("No key stored under tag: {0}")]
    KeyNotFound(String),

    #[error("Random number generation failed: {0}")]
    Rng(String),

    #[error("Crypto operation failed: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, Error>;
