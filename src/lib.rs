//! RSA key format codecs and SEM hybrid message encryption.
//!
//! Keys move between PEM text and DER bytes (`pem`, `asn1`), optionally
//! through the legacy OpenSSL password-encrypted PEM format (`legacy`).
//! Normalized PKCS1 keys feed the SEM engine (`sem`), which wraps a fresh
//! AES key and IV with RSA-OAEP, encrypts the payload, and optionally
//! authenticates the whole message with HMAC. All primitives are reached
//! through the `provider` capability; `keystore` persists PEM keys by tag.

pub mod asn1;
pub mod encoding;
pub mod error;
pub mod keystore;
pub mod legacy;
pub mod mode;
pub mod pem;
pub mod provider;
pub mod sem;

pub use asn1::{add_public_pkcs8_header, strip_private_pkcs8, strip_public_pkcs8};
pub use error::{Error, Result};
pub use keystore::{KeyStore, KeyringStore, MemoryStore};
pub use legacy::{decrypt_pem, encrypt_pem, LegacyAesMode};
pub use mode::{AesMode, BlockMode, HmacMode, SemMode, SEM_VERSION};
pub use pem::{private_pem_to_pkcs1_der, public_pem_to_pkcs1_der, to_der, to_pem, KeyKind};
pub use provider::{
    CipherOp, CryptoProvider, Feature, HashAlg, RsaPaddingMode, RustCryptoProvider,
};
pub use sem::SemEngine;
