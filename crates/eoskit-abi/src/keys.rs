//! Text forms of public keys and signatures.
//!
//! On the wire both are a discriminant byte (0 = K1, 1 = R1) followed by the
//! curve payload (33 bytes for keys, 65 for signatures). The text forms are
//! base58 with a 4-byte RIPEMD-160 checksum: modern `PUB_K1_…` / `SIG_K1_…`
//! strings hash `payload || curve-suffix`, the legacy `EOS…` key form hashes
//! the bare payload. Output always uses the modern form; input accepts both.

use crate::error::KeyError;
use ripemd::{Digest, Ripemd160};

pub const PUBLIC_KEY_DATA_LEN: usize = 33;
pub const SIGNATURE_DATA_LEN: usize = 65;

/// Supported key curves and their wire discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    K1,
    R1,
}

impl Curve {
    pub fn discriminant(self) -> u8 {
        match self {
            Curve::K1 => 0,
            Curve::R1 => 1,
        }
    }

    pub fn from_discriminant(d: u8) -> Result<Self, KeyError> {
        match d {
            0 => Ok(Curve::K1),
            1 => Ok(Curve::R1),
            other => Err(KeyError::UnsupportedCurve {
                discriminant: other,
            }),
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Curve::K1 => "K1",
            Curve::R1 => "R1",
        }
    }
}

fn checksum(payload: &[u8], suffix: &str) -> [u8; 4] {
    let mut hasher = Ripemd160::new();
    hasher.update(payload);
    hasher.update(suffix.as_bytes());
    let digest = hasher.finalize();
    [digest[0], digest[1], digest[2], digest[3]]
}

fn encode_with_checksum(payload: &[u8], suffix: &str) -> String {
    let mut buf = payload.to_vec();
    buf.extend_from_slice(&checksum(payload, suffix));
    bs58::encode(buf).into_string()
}

fn decode_with_checksum(
    kind: &'static str,
    text: &str,
    encoded: &str,
    suffix: &str,
    expected_len: usize,
) -> Result<Vec<u8>, KeyError> {
    let raw = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| KeyError::InvalidText {
            kind,
            text: text.into(),
            reason: e.to_string(),
        })?;
    if raw.len() != expected_len + 4 {
        return Err(KeyError::InvalidText {
            kind,
            text: text.into(),
            reason: format!("expected {} payload bytes", expected_len),
        });
    }
    let (payload, declared) = raw.split_at(expected_len);
    if checksum(payload, suffix) != declared {
        return Err(KeyError::ChecksumMismatch {
            kind,
            text: text.into(),
        });
    }
    Ok(payload.to_vec())
}

/// Render a binary public key (discriminant + 33 bytes) as `PUB_K1_…` / `PUB_R1_…`.
pub fn public_key_to_string(bin: &[u8]) -> Result<String, KeyError> {
    if bin.len() != PUBLIC_KEY_DATA_LEN + 1 {
        return Err(KeyError::InvalidText {
            kind: "public_key",
            text: hex::encode(bin),
            reason: "expected 34 bytes".into(),
        });
    }
    let curve = Curve::from_discriminant(bin[0])?;
    Ok(format!(
        "PUB_{}_{}",
        curve.suffix(),
        encode_with_checksum(&bin[1..], curve.suffix())
    ))
}

/// Parse a public key string into its binary form (discriminant + 33 bytes).
///
/// Accepts the modern `PUB_K1_…` / `PUB_R1_…` forms and the legacy `EOS…`
/// form (K1, checksum without curve suffix).
pub fn public_key_from_string(text: &str) -> Result<Vec<u8>, KeyError> {
    let (curve, payload) = if let Some(rest) = text.strip_prefix("PUB_K1_") {
        (
            Curve::K1,
            decode_with_checksum("public_key", text, rest, "K1", PUBLIC_KEY_DATA_LEN)?,
        )
    } else if let Some(rest) = text.strip_prefix("PUB_R1_") {
        (
            Curve::R1,
            decode_with_checksum("public_key", text, rest, "R1", PUBLIC_KEY_DATA_LEN)?,
        )
    } else if let Some(rest) = text.strip_prefix("EOS") {
        (
            Curve::K1,
            decode_with_checksum("public_key", text, rest, "", PUBLIC_KEY_DATA_LEN)?,
        )
    } else {
        return Err(KeyError::InvalidText {
            kind: "public_key",
            text: text.into(),
            reason: "unknown prefix".into(),
        });
    };
    let mut bin = Vec::with_capacity(PUBLIC_KEY_DATA_LEN + 1);
    bin.push(curve.discriminant());
    bin.extend_from_slice(&payload);
    Ok(bin)
}

/// Render a binary signature (discriminant + 65 bytes) as `SIG_K1_…` / `SIG_R1_…`.
pub fn signature_to_string(bin: &[u8]) -> Result<String, KeyError> {
    if bin.len() != SIGNATURE_DATA_LEN + 1 {
        return Err(KeyError::InvalidText {
            kind: "signature",
            text: hex::encode(bin),
            reason: "expected 66 bytes".into(),
        });
    }
    let curve = Curve::from_discriminant(bin[0])?;
    Ok(format!(
        "SIG_{}_{}",
        curve.suffix(),
        encode_with_checksum(&bin[1..], curve.suffix())
    ))
}

/// Parse a signature string into its binary form (discriminant + 65 bytes).
pub fn signature_from_string(text: &str) -> Result<Vec<u8>, KeyError> {
    let (curve, payload) = if let Some(rest) = text.strip_prefix("SIG_K1_") {
        (
            Curve::K1,
            decode_with_checksum("signature", text, rest, "K1", SIGNATURE_DATA_LEN)?,
        )
    } else if let Some(rest) = text.strip_prefix("SIG_R1_") {
        (
            Curve::R1,
            decode_with_checksum("signature", text, rest, "R1", SIGNATURE_DATA_LEN)?,
        )
    } else {
        return Err(KeyError::InvalidText {
            kind: "signature",
            text: text.into(),
            reason: "unknown prefix".into(),
        });
    };
    let mut bin = Vec::with_capacity(SIGNATURE_DATA_LEN + 1);
    bin.push(curve.discriminant());
    bin.extend_from_slice(&payload);
    Ok(bin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_round_trip() {
        let mut bin = vec![0u8];
        bin.extend_from_slice(&[0x02; 33]);
        let text = public_key_to_string(&bin).unwrap();
        assert!(text.starts_with("PUB_K1_"));
        assert_eq!(public_key_from_string(&text).unwrap(), bin);
    }

    #[test]
    fn r1_key_round_trip() {
        let mut bin = vec![1u8];
        bin.extend_from_slice(&[0x03; 33]);
        let text = public_key_to_string(&bin).unwrap();
        assert!(text.starts_with("PUB_R1_"));
        assert_eq!(public_key_from_string(&text).unwrap(), bin);
    }

    #[test]
    fn legacy_form_accepted() {
        let payload = [0x02u8; 33];
        let legacy = format!("EOS{}", encode_with_checksum(&payload, ""));
        let bin = public_key_from_string(&legacy).unwrap();
        assert_eq!(bin[0], 0);
        assert_eq!(&bin[1..], &payload);
    }

    #[test]
    fn signature_round_trip() {
        let mut bin = vec![0u8];
        bin.extend_from_slice(&[0x1f; 65]);
        let text = signature_to_string(&bin).unwrap();
        assert!(text.starts_with("SIG_K1_"));
        assert_eq!(signature_from_string(&text).unwrap(), bin);
    }

    #[test]
    fn unknown_curve_rejected() {
        let mut bin = vec![9u8];
        bin.extend_from_slice(&[0x02; 33]);
        assert!(matches!(
            public_key_to_string(&bin),
            Err(KeyError::UnsupportedCurve { discriminant: 9 })
        ));
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let mut bin = vec![0u8];
        bin.extend_from_slice(&[0x02; 33]);
        let mut text = public_key_to_string(&bin).unwrap();
        let replacement = if text.ends_with('1') { '2' } else { '1' };
        text.pop();
        text.push(replacement);
        assert!(public_key_from_string(&text).is_err());
    }
}
