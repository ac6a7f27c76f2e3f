//! Hex and base64 helpers shared by the PEM codecs and the SEM transport
//! wrappers.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::Error;

/// Encode bytes as uppercase hex (the DEK-Info IV convention).
pub fn hex_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decode a hex string (either case) to bytes.
pub fn hex_decode(s: &str) -> Result<Vec<u8>, Error> {
    hex::decode(s).map_err(|e| Error::Decode(e.to_string()))
}

/// Standard base64, no line breaks.
pub fn base64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Standard base64 broken into `width`-character lines separated by `\n`.
pub fn base64_encode_wrapped(data: &[u8], width: usize) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / width.max(1) + 1);
    for (i, c) in encoded.chars().enumerate() {
        if i > 0 && i % width == 0 {
            out.push('\n');
        }
        out.push(c);
    }
    out
}

/// Decode standard base64, ignoring embedded whitespace (PEM bodies carry
/// newlines every 64 characters).
pub fn base64_decode(text: &str) -> Result<Vec<u8>, Error> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::Base64Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let data = [0x00, 0x1f, 0xab, 0xff];
        let encoded = hex_upper(&data);
        assert_eq!(encoded, "001FABFF");
        assert_eq!(hex_decode(&encoded).unwrap(), data);
    }

    #[test]
    fn hex_accepts_lowercase() {
        assert_eq!(hex_decode("00ff").unwrap(), vec![0x00, 0xff]);
    }

    #[test]
    fn base64_round_trip() {
        let data = b"Hello, World!";
        let encoded = base64_encode(data);
        assert_eq!(base64_decode(&encoded).unwrap(), data);
    }

    #[test]
    fn wrapped_lines_are_64_chars() {
        let data = vec![0xAB; 100];
        let wrapped = base64_encode_wrapped(&data, 64);
        let lines: Vec<&str> = wrapped.split('\n').collect();
        assert!(lines.len() > 1);
        for line in &lines[..lines.len() - 1] {
            assert_eq!(line.len(), 64);
        }
        assert!(lines.last().unwrap().len() <= 64);
    }

    #[test]
    fn decode_ignores_newlines() {
        let data = vec![0x42; 96];
        let wrapped = base64_encode_wrapped(&data, 64);
        assert!(wrapped.contains('\n'));
        assert_eq!(base64_decode(&wrapped).unwrap(), data);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(base64_decode("not*valid*base64!").is_err());
    }

    #[test]
    fn empty_input() {
        assert_eq!(base64_encode(b""), "");
        assert_eq!(base64_decode("").unwrap(), Vec::<u8>::new());
        assert_eq!(base64_encode_wrapped(b"", 64), "");
    }
}
