//! Content hashing strategies for probe verification.
//!
//! A closed set of named hash functions selected once at run configuration
//! time: SHA-256 for real integrity checks, CRC32 as a faster, weaker
//! alternative for high-volume runs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Named hash strategy. Digests are rendered as lowercase hex so they compare
/// directly against `sha256sum`-style file lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    #[default]
    Sha256,
    Crc32,
}

/// Error for an unrecognized hash function name (CLI/config input).
#[derive(Debug, thiserror::Error)]
#[error("unknown hash function '{0}', expected sha256 or crc32")]
pub struct UnknownHashKind(String);

impl HashKind {
    pub fn from_name(name: &str) -> Result<HashKind, UnknownHashKind> {
        match name {
            "sha256" => Ok(HashKind::Sha256),
            "crc32" => Ok(HashKind::Crc32),
            other => Err(UnknownHashKind(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HashKind::Sha256 => "sha256",
            HashKind::Crc32 => "crc32",
        }
    }

    /// Hash `bytes` and return the digest as lowercase hex.
    /// CRC32 renders as 8 hex chars of the big-endian checksum.
    pub fn digest(self, bytes: &[u8]) -> String {
        match self {
            HashKind::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(bytes);
                hex::encode(hasher.finalize())
            }
            HashKind::Crc32 => format!("{:08x}", crc32fast::hash(bytes)),
        }
    }
}

impl std::str::FromStr for HashKind {
    type Err = UnknownHashKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HashKind::from_name(s)
    }
}

impl std::fmt::Display for HashKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_digests() {
        assert_eq!(
            HashKind::Sha256.digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            HashKind::Sha256.digest(b"hello\n"),
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
    }

    #[test]
    fn crc32_known_digests() {
        // CRC-32/IEEE check value for "123456789".
        assert_eq!(HashKind::Crc32.digest(b"123456789"), "cbf43926");
        assert_eq!(HashKind::Crc32.digest(b""), "00000000");
    }

    #[test]
    fn from_name_accepts_known_rejects_unknown() {
        assert_eq!(HashKind::from_name("sha256").unwrap(), HashKind::Sha256);
        assert_eq!(HashKind::from_name("crc32").unwrap(), HashKind::Crc32);
        assert!(HashKind::from_name("md5").is_err());
    }

    #[test]
    fn serde_lowercase_names() {
        assert_eq!(serde_json::to_string(&HashKind::Sha256).unwrap(), "\"sha256\"");
        let k: HashKind = serde_json::from_str("\"crc32\"").unwrap();
        assert_eq!(k, HashKind::Crc32);
    }
}
