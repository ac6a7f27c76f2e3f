//! Algorithm identifiers for the SEM wire format.
//!
//! Each enumerant carries the sizes the header layout depends on. Wire IDs
//! are the declaration order, starting at 0; version 0 parsers reject any ID
//! they do not know.

/// SEM wire-format version produced and accepted by this crate.
pub const SEM_VERSION: u8 = 0;

/// AES key size selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AesMode {
    Aes128 = 0,
    Aes192 = 1,
    Aes256 = 2,
}

impl AesMode {
    pub fn key_size(self) -> usize {
        match self {
            AesMode::Aes128 => 16,
            AesMode::Aes192 => 24,
            AesMode::Aes256 => 32,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(AesMode::Aes128),
            1 => Some(AesMode::Aes192),
            2 => Some(AesMode::Aes256),
            _ => None,
        }
    }
}

/// Symmetric block mode. CBC carries a 16-byte IV and PKCS7 padding; GCM a
/// 12-byte IV and a trailing 16-byte authentication tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    Cbc = 0,
    Gcm = 1,
}

impl BlockMode {
    pub fn iv_size(self) -> usize {
        match self {
            BlockMode::Cbc => 16,
            BlockMode::Gcm => 12,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(BlockMode::Cbc),
            1 => Some(BlockMode::Gcm),
            _ => None,
        }
    }
}

/// Message authentication selector for the trailing SEM tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HmacMode {
    None = 0,
    Sha256 = 1,
    Sha512 = 2,
}

impl HmacMode {
    pub fn digest_size(self) -> usize {
        match self {
            HmacMode::None => 0,
            HmacMode::Sha256 => 32,
            HmacMode::Sha512 => 64,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(HmacMode::None),
            1 => Some(HmacMode::Sha256),
            2 => Some(HmacMode::Sha512),
            _ => None,
        }
    }
}

/// Cipher configuration for one SEM message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemMode {
    pub aes: AesMode,
    pub block: BlockMode,
    pub hmac: HmacMode,
}

impl SemMode {
    pub fn new(aes: AesMode, block: BlockMode, hmac: HmacMode) -> Self {
        Self { aes, block, hmac }
    }

    /// Exact decrypted header length for this mode: four fixed bytes plus
    /// the symmetric key and IV.
    pub fn header_size(self) -> usize {
        4 + self.aes.key_size() + self.block.iv_size()
    }
}

impl Default for SemMode {
    /// AES-256-CBC with HMAC-SHA256.
    fn default() -> Self {
        Self::new(AesMode::Aes256, BlockMode::Cbc, HmacMode::Sha256)
    }
}
