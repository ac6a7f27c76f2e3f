//! The Crypto Provider capability: entropy, digests, HMAC, AES, and RSA
//! behind one fixed interface.
//!
//! The core codecs and the SEM engine call through [`CryptoProvider`] rather
//! than a concrete library, and branch on [`CryptoProvider::is_available`]
//! for algorithms a provider may lack. [`RustCryptoProvider`] is the
//! build-time default and implements everything with the RustCrypto crates.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, KeyInit};
use hmac::digest::core_api::BlockSizeUser;
use hmac::{Mac, SimpleHmac};
use md5::Md5;
use rsa::pkcs1::{
    DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey,
};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::error::{Error, Result};
use crate::mode::BlockMode;

type Aes192Gcm = AesGcm<Aes192, aes_gcm::aead::consts::U12>;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes192CbcEnc = cbc::Encryptor<Aes192>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Digest selector for [`CryptoProvider::hash`] and [`CryptoProvider::hmac`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlg {
    pub fn digest_size(self) -> usize {
        match self {
            HashAlg::Md5 => 16,
            HashAlg::Sha1 => 20,
            HashAlg::Sha224 => 28,
            HashAlg::Sha256 => 32,
            HashAlg::Sha384 => 48,
            HashAlg::Sha512 => 64,
        }
    }
}

/// Direction for [`CryptoProvider::symmetric_crypt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherOp {
    Encrypt,
    Decrypt,
}

/// RSA padding scheme selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsaPaddingMode {
    Pkcs1,
    Oaep,
}

/// Algorithms a provider may or may not supply at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Gcm,
    Rsa,
}

/// Fixed interface the core calls for every cryptographic primitive.
///
/// All key and IV arguments are raw bytes; RSA keys are bare PKCS1 DER.
pub trait CryptoProvider {
    /// Whether this provider supplies `feature`. Callers branch on this and
    /// surface [`Error::NotAvailable`] instead of failing mid-operation.
    fn is_available(&self, feature: Feature) -> bool;

    fn random_bytes(&self, n: usize) -> Result<Vec<u8>>;

    fn hash(&self, alg: HashAlg, data: &[u8]) -> Result<Vec<u8>>;

    fn hmac(&self, alg: HashAlg, key: &[u8], data: &[u8]) -> Result<Vec<u8>>;

    /// AES in `mode`: CBC with PKCS7 padding, or GCM with a trailing 16-byte
    /// tag (no associated data). Key length selects AES-128/192/256.
    fn symmetric_crypt(
        &self,
        op: CipherOp,
        mode: BlockMode,
        data: &[u8],
        key: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>>;

    /// Generate an RSA key pair, returned as (private, public) PKCS1 DER.
    fn rsa_generate_keypair(&self, bits: usize) -> Result<(Vec<u8>, Vec<u8>)>;

    fn rsa_encrypt(
        &self,
        public_der: &[u8],
        padding: RsaPaddingMode,
        digest: HashAlg,
        data: &[u8],
    ) -> Result<Vec<u8>>;

    /// Decrypt exactly one RSA block from the front of `data`, returning the
    /// plaintext and the unconsumed tail beyond the block.
    fn rsa_decrypt(
        &self,
        private_der: &[u8],
        padding: RsaPaddingMode,
        digest: HashAlg,
        data: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>)>;
}

/// Default provider backed by the RustCrypto crates. Stateless; every
/// algorithm is compiled in, so both features always report available.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

impl CryptoProvider for RustCryptoProvider {
    fn is_available(&self, _feature: Feature) -> bool {
        true
    }

    fn random_bytes(&self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        getrandom::getrandom(&mut buf).map_err(|e| Error::Rng(e.to_string()))?;
        Ok(buf)
    }

    fn hash(&self, alg: HashAlg, data: &[u8]) -> Result<Vec<u8>> {
        Ok(match alg {
            HashAlg::Md5 => Md5::digest(data).to_vec(),
            HashAlg::Sha1 => Sha1::digest(data).to_vec(),
            HashAlg::Sha224 => Sha224::digest(data).to_vec(),
            HashAlg::Sha256 => Sha256::digest(data).to_vec(),
            HashAlg::Sha384 => Sha384::digest(data).to_vec(),
            HashAlg::Sha512 => Sha512::digest(data).to_vec(),
        })
    }

    fn hmac(&self, alg: HashAlg, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        match alg {
            HashAlg::Md5 => hmac_tag::<Md5>(key, data),
            HashAlg::Sha1 => hmac_tag::<Sha1>(key, data),
            HashAlg::Sha224 => hmac_tag::<Sha224>(key, data),
            HashAlg::Sha256 => hmac_tag::<Sha256>(key, data),
            HashAlg::Sha384 => hmac_tag::<Sha384>(key, data),
            HashAlg::Sha512 => hmac_tag::<Sha512>(key, data),
        }
    }

    fn symmetric_crypt(
        &self,
        op: CipherOp,
        mode: BlockMode,
        data: &[u8],
        key: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>> {
        if iv.len() != mode.iv_size() {
            return Err(Error::Param("IV length does not match block mode"));
        }
        match mode {
            BlockMode::Cbc => match (op, key.len()) {
                (CipherOp::Encrypt, 16) => cbc_encrypt::<Aes128CbcEnc>(data, key, iv),
                (CipherOp::Encrypt, 24) => cbc_encrypt::<Aes192CbcEnc>(data, key, iv),
                (CipherOp::Encrypt, 32) => cbc_encrypt::<Aes256CbcEnc>(data, key, iv),
                (CipherOp::Decrypt, 16) => cbc_decrypt::<Aes128CbcDec>(data, key, iv),
                (CipherOp::Decrypt, 24) => cbc_decrypt::<Aes192CbcDec>(data, key, iv),
                (CipherOp::Decrypt, 32) => cbc_decrypt::<Aes256CbcDec>(data, key, iv),
                _ => Err(Error::Param("AES key must be 16, 24, or 32 bytes")),
            },
            BlockMode::Gcm => match key.len() {
                16 => gcm_crypt::<Aes128Gcm>(op, data, key, iv),
                24 => gcm_crypt::<Aes192Gcm>(op, data, key, iv),
                32 => gcm_crypt::<Aes256Gcm>(op, data, key, iv),
                _ => Err(Error::Param("AES key must be 16, 24, or 32 bytes")),
            },
        }
    }

    fn rsa_generate_keypair(&self, bits: usize) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut rng = rand::rngs::OsRng;
        let private =
            RsaPrivateKey::new(&mut rng, bits).map_err(|e| Error::Unknown(e.to_string()))?;
        let public = private.to_public_key();
        let private_der = private
            .to_pkcs1_der()
            .map_err(|e| Error::Unknown(e.to_string()))?
            .as_bytes()
            .to_vec();
        let public_der = public
            .to_pkcs1_der()
            .map_err(|e| Error::Unknown(e.to_string()))?
            .as_bytes()
            .to_vec();
        Ok((private_der, public_der))
    }

    fn rsa_encrypt(
        &self,
        public_der: &[u8],
        padding: RsaPaddingMode,
        digest: HashAlg,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        let key =
            RsaPublicKey::from_pkcs1_der(public_der).map_err(|e| Error::Decode(e.to_string()))?;
        let mut rng = rand::rngs::OsRng;
        match padding {
            RsaPaddingMode::Pkcs1 => key.encrypt(&mut rng, Pkcs1v15Encrypt, data),
            RsaPaddingMode::Oaep => key.encrypt(&mut rng, oaep_padding(digest)?, data),
        }
        .map_err(|e| Error::Unknown(e.to_string()))
    }

    fn rsa_decrypt(
        &self,
        private_der: &[u8],
        padding: RsaPaddingMode,
        digest: HashAlg,
        data: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        let key =
            RsaPrivateKey::from_pkcs1_der(private_der).map_err(|e| Error::Decode(e.to_string()))?;
        let block = key.size();
        if data.len() < block {
            return Err(Error::BufferTooSmall {
                need: block,
                have: data.len(),
            });
        }
        let (head, tail) = data.split_at(block);
        let plain = match padding {
            RsaPaddingMode::Pkcs1 => key.decrypt(Pkcs1v15Encrypt, head),
            RsaPaddingMode::Oaep => key.decrypt(oaep_padding(digest)?, head),
        }
        .map_err(|e| Error::Decode(e.to_string()))?;
        Ok((plain, tail.to_vec()))
    }
}

fn oaep_padding(digest: HashAlg) -> Result<Oaep> {
    Ok(match digest {
        HashAlg::Sha1 => Oaep::new::<Sha1>(),
        HashAlg::Sha224 => Oaep::new::<Sha224>(),
        HashAlg::Sha256 => Oaep::new::<Sha256>(),
        HashAlg::Sha384 => Oaep::new::<Sha384>(),
        HashAlg::Sha512 => Oaep::new::<Sha512>(),
        HashAlg::Md5 => return Err(Error::Param("OAEP digest must be a SHA hash")),
    })
}

fn hmac_tag<D>(key: &[u8], data: &[u8]) -> Result<Vec<u8>>
where
    D: Digest + BlockSizeUser,
{
    let mut mac = <SimpleHmac<D> as Mac>::new_from_slice(key)
        .map_err(|_| Error::Param("invalid HMAC key"))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn cbc_encrypt<E: BlockEncryptMut + KeyIvInit>(data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    let enc = E::new_from_slices(key, iv).map_err(|_| Error::Param("invalid key or IV length"))?;
    Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(data))
}

fn cbc_decrypt<D: BlockDecryptMut + KeyIvInit>(data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    let dec = D::new_from_slices(key, iv).map_err(|_| Error::Param("invalid key or IV length"))?;
    dec.decrypt_padded_vec_mut::<Pkcs7>(data)
        .map_err(|_| Error::Decode("invalid PKCS7 padding".into()))
}

fn gcm_crypt<A: Aead + KeyInit>(op: CipherOp, data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    let cipher = A::new_from_slice(key).map_err(|_| Error::Param("invalid key length"))?;
    let nonce = GenericArray::from_slice(iv);
    match op {
        CipherOp::Encrypt => cipher
            .encrypt(nonce, data)
            .map_err(|_| Error::Unknown("AES-GCM encryption failed".into())),
        CipherOp::Decrypt => cipher
            .decrypt(nonce, data)
            .map_err(|_| Error::Decode("AES-GCM tag mismatch".into())),
    }
}
