//! SEM (Simple Encrypted Message) hybrid encryption.
//!
//! Wire layout:
//!
//! ```text
//! RSA-OAEP(header) || AES(payload) || optional HMAC tag
//! header = version || aesModeId || blockModeId || hmacModeId || key || iv
//! ```
//!
//! A fresh symmetric key and IV are generated per message and bound to the
//! recipient by RSA-OAEP(SHA-1) encryption of the header. The optional HMAC
//! (keyed with the symmetric key) covers the RSA block and the symmetric
//! ciphertext, and is verified before any symmetric decryption is attempted
//! (Encrypt-then-MAC), so tampering is detected without exposing a padding
//! oracle.

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::encoding::{base64_decode, base64_encode};
use crate::error::{Error, Result};
use crate::mode::{AesMode, BlockMode, HmacMode, SemMode, SEM_VERSION};
use crate::pem;
use crate::provider::{CipherOp, CryptoProvider, Feature, HashAlg, RsaPaddingMode, RustCryptoProvider};

/// Fixed header bytes preceding the key and IV.
const HEADER_FIXED: usize = 4;

fn hmac_alg(mode: HmacMode) -> Option<HashAlg> {
    match mode {
        HmacMode::None => None,
        HmacMode::Sha256 => Some(HashAlg::Sha256),
        HmacMode::Sha512 => Some(HashAlg::Sha512),
    }
}

/// Hybrid encryption engine over a [`CryptoProvider`]. Stateless between
/// calls; safe to share across threads.
#[derive(Debug, Clone)]
pub struct SemEngine<P: CryptoProvider> {
    provider: P,
}

impl Default for SemEngine<RustCryptoProvider> {
    fn default() -> Self {
        Self::new(RustCryptoProvider)
    }
}

impl<P: CryptoProvider> SemEngine<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Encrypt `plaintext` to the holder of `recipient_public_pem` under the
    /// given mode, returning the full SEM byte string.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        recipient_public_pem: &str,
        mode: SemMode,
    ) -> Result<Vec<u8>> {
        if !self.provider.is_available(Feature::Rsa) {
            return Err(Error::NotAvailable("RSA"));
        }
        if mode.block == BlockMode::Gcm && !self.provider.is_available(Feature::Gcm) {
            return Err(Error::NotAvailable("AES-GCM"));
        }

        let mut key = self.provider.random_bytes(mode.aes.key_size())?;
        let iv = self.provider.random_bytes(mode.block.iv_size())?;

        let mut header = Vec::with_capacity(mode.header_size());
        header.push(SEM_VERSION);
        header.push(mode.aes.id());
        header.push(mode.block.id());
        header.push(mode.hmac.id());
        header.extend_from_slice(&key);
        header.extend_from_slice(&iv);

        let public_der = pem::public_pem_to_pkcs1_der(recipient_public_pem)?;
        let encrypted_header =
            self.provider
                .rsa_encrypt(&public_der, RsaPaddingMode::Oaep, HashAlg::Sha1, &header)?;
        header.zeroize();

        let ciphertext =
            self.provider
                .symmetric_crypt(CipherOp::Encrypt, mode.block, plaintext, &key, &iv)?;

        let mut message =
            Vec::with_capacity(encrypted_header.len() + ciphertext.len() + mode.hmac.digest_size());
        message.extend_from_slice(&encrypted_header);
        message.extend_from_slice(&ciphertext);

        if let Some(alg) = hmac_alg(mode.hmac) {
            let tag = self.provider.hmac(alg, &key, &message)?;
            message.extend_from_slice(&tag);
        }
        key.zeroize();

        Ok(message)
    }

    /// Decrypt a SEM byte string with the matching private key.
    pub fn decrypt(&self, message: &[u8], owner_private_pem: &str) -> Result<Vec<u8>> {
        if !self.provider.is_available(Feature::Rsa) {
            return Err(Error::NotAvailable("RSA"));
        }

        let private_der = pem::private_pem_to_pkcs1_der(owner_private_pem)?;
        let (mut header, tail) =
            self.provider
                .rsa_decrypt(&private_der, RsaPaddingMode::Oaep, HashAlg::Sha1, message)?;
        let rsa_block = message.len() - tail.len();

        let (mode, key, iv) = parse_header(&header)?;

        if mode.block == BlockMode::Gcm && !self.provider.is_available(Feature::Gcm) {
            header.zeroize();
            return Err(Error::NotAvailable("AES-GCM"));
        }

        let ciphertext = if let Some(alg) = hmac_alg(mode.hmac) {
            let digest_size = mode.hmac.digest_size();
            if tail.len() < digest_size {
                header.zeroize();
                return Err(Error::SemParse("missing authentication tag"));
            }
            let (ciphertext, tag) = tail.split_at(tail.len() - digest_size);
            let authed = &message[..rsa_block + ciphertext.len()];
            let expected = self.provider.hmac(alg, key, authed)?;
            if !bool::from(expected.ct_eq(tag)) {
                header.zeroize();
                return Err(Error::SemAuthentication);
            }
            ciphertext
        } else {
            &tail[..]
        };

        let plaintext =
            self.provider
                .symmetric_crypt(CipherOp::Decrypt, mode.block, ciphertext, key, iv);
        header.zeroize();
        plaintext
    }

    /// Decrypt and interpret the payload as UTF-8 text.
    pub fn decrypt_to_string(&self, message: &[u8], owner_private_pem: &str) -> Result<String> {
        String::from_utf8(self.decrypt(message, owner_private_pem)?)
            .map_err(|e| Error::Utf8Decode(e.to_string()))
    }

    /// [`Self::encrypt`], base64-encoded for text transport.
    pub fn encrypt_to_base64(
        &self,
        plaintext: &[u8],
        recipient_public_pem: &str,
        mode: SemMode,
    ) -> Result<String> {
        Ok(base64_encode(&self.encrypt(plaintext, recipient_public_pem, mode)?))
    }

    /// Decrypt a base64-wrapped SEM message.
    pub fn decrypt_from_base64(&self, message: &str, owner_private_pem: &str) -> Result<Vec<u8>> {
        self.decrypt(&base64_decode(message)?, owner_private_pem)
    }
}

/// Validate the decrypted header and borrow the key and IV out of it.
fn parse_header(header: &[u8]) -> Result<(SemMode, &[u8], &[u8])> {
    if header.len() <= HEADER_FIXED {
        return Err(Error::SemParse("header too short"));
    }
    if header[0] != SEM_VERSION {
        return Err(Error::SemUnsupportedVersion(header[0]));
    }
    let aes = AesMode::from_id(header[1]).ok_or(Error::SemParse("unknown AES mode id"))?;
    let block = BlockMode::from_id(header[2]).ok_or(Error::SemParse("unknown block mode id"))?;
    let hmac = HmacMode::from_id(header[3]).ok_or(Error::SemParse("unknown HMAC mode id"))?;
    let mode = SemMode::new(aes, block, hmac);

    if header.len() != mode.header_size() {
        return Err(Error::SemParse("header length does not match declared modes"));
    }
    let key = &header[HEADER_FIXED..HEADER_FIXED + aes.key_size()];
    let iv = &header[HEADER_FIXED + aes.key_size()..];
    Ok((mode, key, iv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1;
    use crate::pem::KeyKind;

    fn engine() -> SemEngine<RustCryptoProvider> {
        SemEngine::default()
    }

    /// 1024-bit keys keep the tests fast; OAEP-SHA1 leaves 86 bytes of
    /// capacity, enough for the largest header (52 bytes).
    fn test_keypair() -> (String, String) {
        let (private_der, public_der) = RustCryptoProvider.rsa_generate_keypair(1024).unwrap();
        let private_pem = pem::to_pem(&private_der, KeyKind::Pkcs1Private);
        let public_pem = pem::to_pem(&asn1::add_public_pkcs8_header(&public_der), KeyKind::Public);
        (private_pem, public_pem)
    }

    #[test]
    fn round_trip_default_mode() {
        let (private_pem, public_pem) = test_keypair();
        let sem = engine();
        let message = sem.encrypt(b"hello world", &public_pem, SemMode::default()).unwrap();
        assert_eq!(sem.decrypt(&message, &private_pem).unwrap(), b"hello world");
        assert_eq!(sem.decrypt_to_string(&message, &private_pem).unwrap(), "hello world");
    }

    /// Provider that reports GCM unsupported, as a dynamically resolved
    /// system library might.
    struct NoGcmProvider;

    impl CryptoProvider for NoGcmProvider {
        fn is_available(&self, feature: Feature) -> bool {
            feature == Feature::Rsa
        }

        fn random_bytes(&self, n: usize) -> crate::Result<Vec<u8>> {
            RustCryptoProvider.random_bytes(n)
        }

        fn hash(&self, alg: HashAlg, data: &[u8]) -> crate::Result<Vec<u8>> {
            RustCryptoProvider.hash(alg, data)
        }

        fn hmac(&self, alg: HashAlg, key: &[u8], data: &[u8]) -> crate::Result<Vec<u8>> {
            RustCryptoProvider.hmac(alg, key, data)
        }

        fn symmetric_crypt(
            &self,
            op: CipherOp,
            mode: BlockMode,
            data: &[u8],
            key: &[u8],
            iv: &[u8],
        ) -> crate::Result<Vec<u8>> {
            RustCryptoProvider.symmetric_crypt(op, mode, data, key, iv)
        }

        fn rsa_generate_keypair(&self, bits: usize) -> crate::Result<(Vec<u8>, Vec<u8>)> {
            RustCryptoProvider.rsa_generate_keypair(bits)
        }

        fn rsa_encrypt(
            &self,
            public_der: &[u8],
            padding: RsaPaddingMode,
            digest: HashAlg,
            data: &[u8],
        ) -> crate::Result<Vec<u8>> {
            RustCryptoProvider.rsa_encrypt(public_der, padding, digest, data)
        }

        fn rsa_decrypt(
            &self,
            private_der: &[u8],
            padding: RsaPaddingMode,
            digest: HashAlg,
            data: &[u8],
        ) -> crate::Result<(Vec<u8>, Vec<u8>)> {
            RustCryptoProvider.rsa_decrypt(private_der, padding, digest, data)
        }
    }

    #[test]
    fn missing_gcm_support_is_reported_not_crashed() {
        let (private_pem, public_pem) = test_keypair();
        let gcm_mode = SemMode::new(AesMode::Aes128, BlockMode::Gcm, HmacMode::None);
        let limited = SemEngine::new(NoGcmProvider);

        assert!(matches!(
            limited.encrypt(b"x", &public_pem, gcm_mode),
            Err(Error::NotAvailable("AES-GCM"))
        ));

        // A full peer's GCM message is also rejected up front on decrypt.
        let message = engine().encrypt(b"x", &public_pem, gcm_mode).unwrap();
        assert!(matches!(
            limited.decrypt(&message, &private_pem),
            Err(Error::NotAvailable("AES-GCM"))
        ));
    }

    #[test]
    fn round_trip_every_mode_combination() {
        let (private_pem, public_pem) = test_keypair();
        let sem = engine();
        let plaintext = b"the quick brown fox";
        for aes in [AesMode::Aes128, AesMode::Aes192, AesMode::Aes256] {
            for block in [BlockMode::Cbc, BlockMode::Gcm] {
                for hmac in [HmacMode::None, HmacMode::Sha256, HmacMode::Sha512] {
                    let mode = SemMode::new(aes, block, hmac);
                    let message = sem.encrypt(plaintext, &public_pem, mode).unwrap();
                    let decrypted = sem.decrypt(&message, &private_pem).unwrap();
                    assert_eq!(decrypted, plaintext, "mode {mode:?}");
                }
            }
        }
    }

    #[test]
    fn fresh_key_and_iv_per_message() {
        let (_, public_pem) = test_keypair();
        let sem = engine();
        let a = sem.encrypt(b"same input", &public_pem, SemMode::default()).unwrap();
        let b = sem.encrypt(b"same input", &public_pem, SemMode::default()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tag_appended_only_when_authenticated() {
        let (_, public_pem) = test_keypair();
        let sem = engine();
        let mode_plain = SemMode::new(AesMode::Aes128, BlockMode::Cbc, HmacMode::None);
        let mode_authed = SemMode::new(AesMode::Aes128, BlockMode::Cbc, HmacMode::Sha512);
        let plain = sem.encrypt(b"x", &public_pem, mode_plain).unwrap();
        let authed = sem.encrypt(b"x", &public_pem, mode_authed).unwrap();
        assert_eq!(authed.len(), plain.len() + 64);
    }

    #[test]
    fn tampered_ciphertext_or_tag_fails_authentication() {
        let (private_pem, public_pem) = test_keypair();
        let sem = engine();
        let message = sem.encrypt(b"attack at dawn", &public_pem, SemMode::default()).unwrap();
        // 1024-bit key: bytes past 128 are symmetric ciphertext, then tag.
        for index in [128, message.len() - 33, message.len() - 1] {
            let mut tampered = message.clone();
            tampered[index] ^= 0xFF;
            assert!(matches!(
                sem.decrypt(&tampered, &private_pem),
                Err(Error::SemAuthentication)
            ));
        }
    }

    #[test]
    fn tampered_rsa_block_fails() {
        let (private_pem, public_pem) = test_keypair();
        let sem = engine();
        let mut message = sem.encrypt(b"secret", &public_pem, SemMode::default()).unwrap();
        message[5] ^= 0xFF;
        assert!(sem.decrypt(&message, &private_pem).is_err());
    }

    #[test]
    fn unauthenticated_cbc_tamper_is_not_silent_success() {
        let (private_pem, public_pem) = test_keypair();
        let sem = engine();
        let mode = SemMode::new(AesMode::Aes256, BlockMode::Cbc, HmacMode::None);
        let plaintext = b"sixteen byte msg";
        let mut message = sem.encrypt(plaintext, &public_pem, mode).unwrap();
        let last = message.len() - 1;
        message[last] ^= 0xFF;
        match sem.decrypt(&message, &private_pem) {
            Err(_) => {}
            Ok(garbage) => assert_ne!(garbage, plaintext),
        }
    }

    #[test]
    fn rejects_unsupported_version() {
        let (private_pem, public_pem) = test_keypair();
        let provider = RustCryptoProvider;
        let public_der = pem::public_pem_to_pkcs1_der(&public_pem).unwrap();

        let mut header = vec![1u8, AesMode::Aes128.id(), BlockMode::Cbc.id(), HmacMode::None.id()];
        header.extend_from_slice(&[0u8; 16]);
        header.extend_from_slice(&[0u8; 16]);
        let message = provider
            .rsa_encrypt(&public_der, RsaPaddingMode::Oaep, HashAlg::Sha1, &header)
            .unwrap();

        assert!(matches!(
            engine().decrypt(&message, &private_pem),
            Err(Error::SemUnsupportedVersion(1))
        ));
    }

    #[test]
    fn rejects_unknown_mode_ids() {
        let (private_pem, public_pem) = test_keypair();
        let provider = RustCryptoProvider;
        let public_der = pem::public_pem_to_pkcs1_der(&public_pem).unwrap();

        let mut header = vec![SEM_VERSION, 9, 0, 0];
        header.extend_from_slice(&[0u8; 32]);
        let message = provider
            .rsa_encrypt(&public_der, RsaPaddingMode::Oaep, HashAlg::Sha1, &header)
            .unwrap();

        assert!(matches!(
            engine().decrypt(&message, &private_pem),
            Err(Error::SemParse(_))
        ));
    }

    #[test]
    fn rejects_header_length_mismatch() {
        let (private_pem, public_pem) = test_keypair();
        let provider = RustCryptoProvider;
        let public_der = pem::public_pem_to_pkcs1_der(&public_pem).unwrap();

        // Declares AES-256-CBC but carries a 16-byte key.
        let mut header = vec![
            SEM_VERSION,
            AesMode::Aes256.id(),
            BlockMode::Cbc.id(),
            HmacMode::None.id(),
        ];
        header.extend_from_slice(&[0u8; 16]);
        header.extend_from_slice(&[0u8; 16]);
        let message = provider
            .rsa_encrypt(&public_der, RsaPaddingMode::Oaep, HashAlg::Sha1, &header)
            .unwrap();

        assert!(matches!(
            engine().decrypt(&message, &private_pem),
            Err(Error::SemParse(_))
        ));
    }

    #[test]
    fn rejects_truncated_tail_before_decrypting() {
        let (private_pem, public_pem) = test_keypair();
        let sem = engine();
        let mode = SemMode::new(AesMode::Aes128, BlockMode::Cbc, HmacMode::Sha512);
        let message = sem.encrypt(b"payload", &public_pem, mode).unwrap();
        // Keep the RSA block and a sliver of tail, shorter than the tag.
        let truncated = &message[..128 + 10];
        assert!(matches!(
            sem.decrypt(truncated, &private_pem),
            Err(Error::SemParse(_))
        ));
    }

    #[test]
    fn rejects_input_shorter_than_one_rsa_block() {
        let (private_pem, _) = test_keypair();
        assert!(matches!(
            engine().decrypt(&[0u8; 64], &private_pem),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn base64_transport_round_trip() {
        let (private_pem, public_pem) = test_keypair();
        let sem = engine();
        let text = sem
            .encrypt_to_base64(b"wire safe", &public_pem, SemMode::default())
            .unwrap();
        assert!(text.is_ascii());
        assert_eq!(sem.decrypt_from_base64(&text, &private_pem).unwrap(), b"wire safe");
    }

    #[test]
    fn rejects_public_key_for_decrypt() {
        let (_, public_pem) = test_keypair();
        let sem = engine();
        assert!(sem.decrypt(&[0u8; 128], &public_pem).is_err());
    }
}
