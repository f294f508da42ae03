//! EOSIO-family chain names.
//!
//! Names identify accounts, actions, permissions, and tables. On the wire a
//! name is a 64-bit integer: twelve characters at 5 bits each plus a
//! 4-bit thirteenth character, drawn from the base32 alphabet
//! `.12345abcdefghijklmnopqrstuvwxyz`.

use crate::error::NameError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// A validated chain name.
///
/// Invariants: 1–13 characters from `[a-z1-5.]`, no leading or trailing
/// period, no consecutive periods, and a thirteenth character (when present)
/// restricted to the 16-symbol subset `[.1-5a-j]`. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name {
    text: String,
    value: u64,
}

impl Name {
    /// Construct a name, validating the character and position rules.
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let text = name.into();
        validate(&text)?;
        let value = pack(&text);
        Ok(Self { text, value })
    }

    /// Reconstruct a name from its packed 64-bit form.
    pub fn from_u64(value: u64) -> Self {
        let text = unpack(value);
        Self { text, value }
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The packed 64-bit wire form.
    pub fn as_u64(&self) -> u64 {
        self.value
    }
}

fn symbol(c: u8) -> Option<u64> {
    match c {
        b'.' => Some(0),
        b'1'..=b'5' => Some((c - b'0') as u64),
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        _ => None,
    }
}

fn validate(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.len() > 13 {
        return Err(NameError::TooLong { name: name.into() });
    }
    let bytes = name.as_bytes();
    for (i, &c) in bytes.iter().enumerate() {
        let sym = symbol(c).ok_or_else(|| NameError::InvalidCharacter {
            name: name.into(),
            ch: c as char,
        })?;
        if c == b'.' {
            if i == 0 || i == bytes.len() - 1 {
                return Err(NameError::EdgePeriod { name: name.into() });
            }
            if bytes[i - 1] == b'.' {
                return Err(NameError::DoublePeriod { name: name.into() });
            }
        }
        // The 13th slot only has 4 bits on the wire.
        if i == 12 && sym > 0x0f {
            return Err(NameError::InvalidThirteenth {
                name: name.into(),
                ch: c as char,
            });
        }
    }
    Ok(())
}

fn pack(name: &str) -> u64 {
    let bytes = name.as_bytes();
    let mut value: u64 = 0;
    for i in 0..13usize {
        let sym = if i < bytes.len() {
            symbol(bytes[i]).unwrap_or(0)
        } else {
            0
        };
        if i < 12 {
            value |= (sym & 0x1f) << (64 - 5 * (i + 1));
        } else {
            value |= sym & 0x0f;
        }
    }
    value
}

fn unpack(value: u64) -> String {
    let mut chars = [b'.'; 13];
    let mut tmp = value;
    for i in 0..13usize {
        let idx = if i == 0 { tmp & 0x0f } else { tmp & 0x1f };
        chars[12 - i] = CHARMAP[idx as usize];
        tmp >>= if i == 0 { 4 } else { 5 };
    }
    let s = String::from_utf8_lossy(&chars).into_owned();
    s.trim_end_matches('.').to_string()
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Name::new(s)
    }
}

impl TryFrom<&str> for Name {
    type Error = NameError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Name::new(s)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Name::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for s in ["a", "abc", "eosio.token", "cryptkeeper", "a.b.c", "zzzzzzzzzzzz"] {
            assert!(Name::new(s).is_ok(), "{s} should be valid");
        }
    }

    #[test]
    fn invalid_names() {
        assert!(Name::new("").is_err());
        assert!(Name::new("ABC").is_err());
        assert!(Name::new("abc.").is_err());
        assert!(Name::new(".abc").is_err());
        assert!(Name::new("ab..c").is_err());
        assert!(Name::new("abc123456").is_err()); // '6' is outside [a-z1-5.]
        assert!(Name::new("abcdefghijklmn").is_err()); // 14 chars
        assert!(Name::new("zzzzzzzzzzzzz").is_err()); // 13th char 'z' > 4 bits
    }

    #[test]
    fn thirteenth_character_subset() {
        assert!(Name::new("aaaaaaaaaaaaj").is_ok());
        assert!(Name::new("aaaaaaaaaaaak").is_err());
    }

    #[test]
    fn packs_known_values() {
        // Values asserted against the reference chain encoding.
        assert_eq!(Name::new("todd").unwrap().as_u64(), 0xcd12_9000_0000_0000);
        assert_eq!(Name::new("eosio.token").unwrap().as_u64(), 0x5530_ea03_3482_a600);
    }

    #[test]
    fn round_trips_through_u64() {
        for s in ["todd", "brandon", "eosio.token", "a", "a.b", "aaaaaaaaaaaaj"] {
            let name = Name::new(s).unwrap();
            assert_eq!(Name::from_u64(name.as_u64()).as_str(), s);
        }
    }

    #[test]
    fn serde_round_trip() {
        let name = Name::new("eosio.token").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"eosio.token\"");
        let back: Name = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }

    #[test]
    fn serde_rejects_invalid() {
        assert!(serde_json::from_str::<Name>("\"ABC\"").is_err());
    }
}
