//! Replica reader
//!
//! A missing replica file is a valid state ("never written"), not an error.
//! Any other read failure is an infrastructure error, distinct from both
//! absence and corruption.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, error};

use super::config::ReplicaRole;
use super::errors::{CellError, CellResult};
use crate::observability::Event;

/// Reads the raw bytes of one replica.
///
/// # Returns
///
/// - `Ok(Some(bytes))` if the file exists
/// - `Ok(None)` if the file does not exist
/// - `Err(TWIN_REPLICA_IO)` on any other failure
pub fn read_replica(path: &Path, role: ReplicaRole) -> CellResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => {
            debug!(
                event = %Event::ReplicaRead,
                role = %role,
                path = %path.display(),
                bytes = bytes.len(),
                "replica read"
            );
            Ok(Some(bytes))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(
                event = %Event::ReplicaRead,
                role = %role,
                path = %path.display(),
                "replica absent"
            );
            Ok(None)
        }
        Err(e) => {
            error!(
                event = %Event::ReplicaIoFailed,
                role = %role,
                path = %path.display(),
                error = %e,
                "replica read failed"
            );
            Err(CellError::infrastructure(
                role,
                format!("Failed to read {} replica", role),
                path,
                e,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::errors::CellErrorCode;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let result = read_replica(&dir.path().join("main"), ReplicaRole::Main).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_missing_parent_is_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("not").join("created").join("backup");
        assert!(read_replica(&path, ReplicaRole::Backup).unwrap().is_none());
    }

    #[test]
    fn test_reads_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main");
        fs::write(&path, b"raw bytes").unwrap();
        let bytes = read_replica(&path, ReplicaRole::Main).unwrap();
        assert_eq!(bytes, Some(b"raw bytes".to_vec()));
    }

    #[test]
    fn test_reads_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main");
        fs::write(&path, b"").unwrap();
        assert_eq!(read_replica(&path, ReplicaRole::Main).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_directory_is_infrastructure_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup");
        fs::create_dir(&path).unwrap();

        let err = read_replica(&path, ReplicaRole::Backup).unwrap_err();
        assert_eq!(err.code(), CellErrorCode::Infrastructure);
        assert!(err.is_critical());
        assert!(!err.is_corrupt());
        assert!(err.details().unwrap_or_default().contains("backup"));
    }
}
