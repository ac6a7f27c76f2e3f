//! Minimal ASN.1/DER walker for moving RSA keys between their PKCS1 and
//! PKCS8 encodings.
//!
//! PKCS8 wraps a PKCS1 body in an envelope:
//!
//! private: `SEQUENCE { INTEGER 0, AlgorithmIdentifier, OCTET STRING { pkcs1 } }`
//! public:  `SEQUENCE { AlgorithmIdentifier, BIT STRING { 0x00, pkcs1 } }`
//!
//! Only the envelope is parsed; the PKCS1 body is passed through untouched.
//! Every advance through the buffer is bounds-checked and surfaces
//! [`Error::Asn1Parse`] with the failing offset instead of indexing out of
//! range.

use crate::error::{Error, Result};

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OCTET_STRING: u8 = 0x04;

/// The rsaEncryption AlgorithmIdentifier:
/// `SEQUENCE { OID 1.2.840.113549.1.1.1, NULL }`.
const RSA_ALGORITHM_ID: [u8; 15] = [
    0x30, 0x0D, 0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01, 0x05, 0x00,
];

/// Longest long-form length accepted (4 length bytes = 4 GiB), far beyond any
/// real-world key.
const MAX_LENGTH_BYTES: usize = 4;

/// Bounds-checked cursor over a DER buffer.
struct DerCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DerCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn err(&self, reason: &'static str) -> Error {
        Error::Asn1Parse {
            offset: self.pos,
            reason,
        }
    }

    fn peek(&self) -> Result<u8> {
        self.bytes
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.err("unexpected end of input"))
    }

    fn read_u8(&mut self) -> Result<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Ok(b)
    }

    fn expect_tag(&mut self, tag: u8, reason: &'static str) -> Result<()> {
        if self.peek()? != tag {
            return Err(self.err(reason));
        }
        self.pos += 1;
        Ok(())
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        if self.bytes.len() - self.pos < n {
            return Err(self.err("unexpected end of input"));
        }
        self.pos += n;
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.bytes.len() - self.pos < n {
            return Err(self.err("content extends past end of input"));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a DER length: one byte below 0x80, otherwise `0x80 | n` followed
    /// by `n` big-endian length bytes. Long-form lengths are parsed as real
    /// multi-byte integers, not assumed to be single-byte.
    fn read_length(&mut self) -> Result<usize> {
        let first = self.read_u8()?;
        if first < 0x80 {
            return Ok(first as usize);
        }
        let count = (first & 0x7F) as usize;
        if count == 0 || count > MAX_LENGTH_BYTES {
            return Err(self.err("unsupported length-of-length"));
        }
        let mut value = 0usize;
        for _ in 0..count {
            value = (value << 8) | self.read_u8()? as usize;
        }
        Ok(value)
    }
}

/// Encode a DER length: values below 128 as a single byte, otherwise
/// `0x80 | byte_count` followed by the minimal big-endian representation.
pub fn encode_length(value: usize) -> Vec<u8> {
    if value < 0x80 {
        return vec![value as u8];
    }
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    let mut out = Vec::with_capacity(1 + bytes.len() - skip);
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
    out
}

/// Strip the PKCS8 envelope from an RSA private key, returning the bare
/// PKCS1 body. A key that is already PKCS1 is returned unchanged.
pub fn strip_private_pkcs8(der: &[u8]) -> Result<Vec<u8>> {
    let mut cur = DerCursor::new(der);
    cur.expect_tag(TAG_SEQUENCE, "expected outer SEQUENCE")?;
    cur.read_length()?;

    // Both encodings open with a version INTEGER (02 01 00).
    if cur.peek()? != TAG_INTEGER {
        return Err(cur.err("expected version INTEGER"));
    }
    cur.skip(3)?;

    // PKCS1 continues straight into the modulus INTEGER; no envelope.
    if cur.peek()? == TAG_INTEGER {
        return Ok(der.to_vec());
    }

    if cur.take(RSA_ALGORITHM_ID.len())? != RSA_ALGORITHM_ID {
        return Err(Error::Asn1Parse {
            offset: cur.pos,
            reason: "expected rsaEncryption AlgorithmIdentifier",
        });
    }
    cur.expect_tag(TAG_OCTET_STRING, "expected OCTET STRING")?;
    let len = cur.read_length()?;
    if cur.peek()? != TAG_SEQUENCE {
        return Err(cur.err("expected PKCS1 SEQUENCE inside OCTET STRING"));
    }
    Ok(cur.take(len)?.to_vec())
}

/// Strip the PKCS8 (SubjectPublicKeyInfo) envelope from an RSA public key,
/// returning the bare PKCS1 body. A key that is already PKCS1 is returned
/// unchanged.
pub fn strip_public_pkcs8(der: &[u8]) -> Result<Vec<u8>> {
    let mut cur = DerCursor::new(der);
    cur.expect_tag(TAG_SEQUENCE, "expected outer SEQUENCE")?;
    cur.read_length()?;

    // PKCS1 opens with the modulus INTEGER; SPKI with the AlgorithmIdentifier.
    if cur.peek()? == TAG_INTEGER {
        return Ok(der.to_vec());
    }

    if cur.take(RSA_ALGORITHM_ID.len())? != RSA_ALGORITHM_ID {
        return Err(Error::Asn1Parse {
            offset: cur.pos,
            reason: "expected rsaEncryption AlgorithmIdentifier",
        });
    }
    cur.expect_tag(TAG_BIT_STRING, "expected BIT STRING")?;
    let len = cur.read_length()?;
    if len == 0 {
        return Err(cur.err("empty BIT STRING"));
    }
    if cur.read_u8()? != 0x00 {
        return Err(Error::Asn1Parse {
            offset: cur.pos,
            reason: "expected zero unused-bits byte",
        });
    }
    if cur.peek()? != TAG_SEQUENCE {
        return Err(cur.err("expected PKCS1 SEQUENCE inside BIT STRING"));
    }
    Ok(cur.take(len - 1)?.to_vec())
}

/// Wrap a bare PKCS1 RSA public key in the PKCS8 (SubjectPublicKeyInfo)
/// envelope.
pub fn add_public_pkcs8_header(der: &[u8]) -> Vec<u8> {
    let bit_string_len = encode_length(der.len() + 1);

    let inner_len = RSA_ALGORITHM_ID.len() + 1 + bit_string_len.len() + 1 + der.len();
    let outer_len = encode_length(inner_len);

    let mut out = Vec::with_capacity(1 + outer_len.len() + inner_len);
    out.push(TAG_SEQUENCE);
    out.extend_from_slice(&outer_len);
    out.extend_from_slice(&RSA_ALGORITHM_ID);
    out.push(TAG_BIT_STRING);
    out.extend_from_slice(&bit_string_len);
    out.push(0x00);
    out.extend_from_slice(der);
    out
}
