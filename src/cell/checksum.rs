//! Checksum computation for replica records
//!
//! Every record ends with a fixed-length digest of its payload. The digest
//! is an integrity detector, not an authenticator.
//!
//! - `Crc32` (default): IEEE polynomial via crc32fast, 4 bytes, little-endian
//! - `Sha256`: 32 bytes via sha2

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Digest algorithm used to seal a record.
///
/// Chosen at construction time; both replicas of a cell always use the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumKind {
    /// CRC32, 4 bytes. Detects every burst error of up to 32 bits.
    #[default]
    Crc32,
    /// SHA-256, 32 bytes.
    Sha256,
}

impl ChecksumKind {
    /// Length in bytes of the digest appended to every record.
    pub fn size(&self) -> usize {
        match self {
            ChecksumKind::Crc32 => 4,
            ChecksumKind::Sha256 => 32,
        }
    }

    /// Computes the digest of `data`.
    ///
    /// This function is deterministic: the same input always produces the same output.
    pub fn compute(&self, data: &[u8]) -> Vec<u8> {
        match self {
            ChecksumKind::Crc32 => {
                let mut hasher = Hasher::new();
                hasher.update(data);
                hasher.finalize().to_le_bytes().to_vec()
            }
            ChecksumKind::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    /// Verifies that the digest of `data` matches `expected`.
    pub fn verify(&self, data: &[u8], expected: &[u8]) -> bool {
        self.compute(data) == expected
    }

    /// Short lowercase name, used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumKind::Crc32 => "crc32",
            ChecksumKind::Sha256 => "sha256",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_deterministic() {
        let data = b"dual replica test data";
        for kind in [ChecksumKind::Crc32, ChecksumKind::Sha256] {
            assert_eq!(kind.compute(data), kind.compute(data));
        }
    }

    #[test]
    fn test_digest_length_matches_size() {
        for kind in [ChecksumKind::Crc32, ChecksumKind::Sha256] {
            assert_eq!(kind.compute(b"").len(), kind.size());
            assert_eq!(kind.compute(b"some payload").len(), kind.size());
        }
    }

    #[test]
    fn test_checksum_detects_bit_flip() {
        let mut data = vec![0x00, 0x01, 0x02, 0x03, 0x04];
        let original = ChecksumKind::Crc32.compute(&data);
        data[2] ^= 0x01;
        assert_ne!(original, ChecksumKind::Crc32.compute(&data));
    }

    #[test]
    fn test_crc32_is_little_endian_ieee() {
        // Known CRC32 (IEEE) of "123456789" is 0xCBF43926.
        let digest = ChecksumKind::Crc32.compute(b"123456789");
        assert_eq!(digest, 0xCBF4_3926u32.to_le_bytes().to_vec());
    }

    #[test]
    fn test_verify_checksum() {
        let data = b"test payload";
        let kind = ChecksumKind::Sha256;
        let digest = kind.compute(data);
        assert!(kind.verify(data, &digest));
        assert!(!kind.verify(b"test payloaD", &digest));
    }

    #[test]
    fn test_default_is_crc32() {
        assert_eq!(ChecksumKind::default(), ChecksumKind::Crc32);
    }
}
