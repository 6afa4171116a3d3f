//! Record format for replica files
//!
//! Record layout:
//! ```text
//! +--------------------+----------------------------+
//! | payload (N bytes)  | checksum (check_size bytes)|
//! +--------------------+----------------------------+
//! ```
//!
//! No magic number, no version, no length prefix. The checksum covers the
//! payload only. `decode` is the single gate every byte read from a replica
//! passes before being treated as a payload.

use super::checksum::ChecksumKind;
use super::errors::{CellError, CellResult};

/// Encodes and verifies records with a fixed checksum algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordCodec {
    checksum: ChecksumKind,
}

impl RecordCodec {
    pub fn new(checksum: ChecksumKind) -> Self {
        Self { checksum }
    }

    /// Length of the trailing checksum.
    pub fn check_size(&self) -> usize {
        self.checksum.size()
    }

    pub fn checksum(&self) -> ChecksumKind {
        self.checksum
    }

    /// `payload || checksum(payload)`
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let mut record = Vec::with_capacity(payload.len() + self.check_size());
        record.extend_from_slice(payload);
        record.extend_from_slice(&self.checksum.compute(payload));
        record
    }

    /// Splits off and verifies the trailing checksum.
    ///
    /// # Errors
    ///
    /// - `TWIN_RECORD_FORMAT` if the record is shorter than the checksum
    /// - `TWIN_RECORD_INTEGRITY` if the checksum does not match
    pub fn decode(&self, record: &[u8]) -> CellResult<Vec<u8>> {
        let check_size = self.check_size();
        if record.len() < check_size {
            return Err(CellError::format(record.len(), check_size));
        }

        let (body, stored) = record.split_at(record.len() - check_size);
        if !self.checksum.verify(body, stored) {
            return Err(CellError::integrity(record.len()));
        }

        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::errors::CellErrorCode;

    #[test]
    fn test_encode_appends_checksum() {
        let codec = RecordCodec::default();
        let record = codec.encode(b"test data");
        assert_eq!(record.len(), 9 + 4);
        assert_eq!(&record[..9], b"test data");
        assert_eq!(&record[9..], ChecksumKind::Crc32.compute(b"test data").as_slice());
    }

    #[test]
    fn test_decode_valid_record() {
        let codec = RecordCodec::new(ChecksumKind::Sha256);
        let record = codec.encode(b"payload");
        assert_eq!(codec.decode(&record).unwrap(), b"payload".to_vec());
    }

    #[test]
    fn test_empty_payload() {
        let codec = RecordCodec::default();
        let record = codec.encode(b"");
        assert_eq!(record.len(), codec.check_size());
        assert_eq!(codec.decode(&record).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_short_record() {
        let codec = RecordCodec::default();
        for len in 0..codec.check_size() {
            let err = codec.decode(&vec![0u8; len]).unwrap_err();
            assert_eq!(err.code(), CellErrorCode::Format);
        }
    }

    #[test]
    fn test_decode_truncated_record() {
        let codec = RecordCodec::default();
        let record = codec.encode(b"some longer payload");
        let err = codec.decode(&record[..record.len() - 1]).unwrap_err();
        assert_eq!(err.code(), CellErrorCode::Integrity);
    }

    #[test]
    fn test_decode_with_other_checksum_kind() {
        let record = RecordCodec::new(ChecksumKind::Crc32).encode(&[7u8; 64]);
        let err = RecordCodec::new(ChecksumKind::Sha256).decode(&record).unwrap_err();
        assert_eq!(err.code(), CellErrorCode::Integrity);
    }
}
