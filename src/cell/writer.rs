//! Replica writer with fsync enforcement
//!
//! Every replica write is a full truncating overwrite followed by fsync of
//! the file and of its directory. Nothing is acknowledged before fsync.
//!
//! No atomic rename is used: a crash mid-write may leave the file in any
//! partial state, which the record checksum later exposes.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use super::config::ReplicaRole;
use super::errors::{CellError, CellResult};
use crate::crash_point::{maybe_crash, points};
use crate::observability::Event;

/// fsync a directory so entries created in it are durable.
///
/// On Unix, this opens the directory and calls fsync on it. Other platforms
/// cannot open directories as files; there it is a no-op.
pub fn fsync_dir(dir: &Path, role: ReplicaRole) -> CellResult<()> {
    if !cfg!(unix) {
        return Ok(());
    }

    let d = OpenOptions::new().read(true).open(dir).map_err(|e| {
        CellError::infrastructure(role, "Failed to open directory for fsync", dir, e)
    })?;

    d.sync_all()
        .map_err(|e| CellError::infrastructure(role, "fsync directory failed", dir, e))
}

/// Creates `dir` and any missing ancestors, making every new entry durable.
///
/// Each newly created directory's parent is fsynced, from the first
/// ancestor that already existed downwards. Directories that already
/// existed are left alone.
///
/// # Returns
///
/// The directories that were created, outermost first.
pub fn create_dir_durable(dir: &Path, role: ReplicaRole) -> CellResult<Vec<PathBuf>> {
    let mut missing = Vec::new();
    let mut current = Some(dir).filter(|d| !d.as_os_str().is_empty());
    while let Some(d) = current {
        if d.exists() {
            break;
        }
        missing.push(d.to_path_buf());
        current = d.parent().filter(|p| !p.as_os_str().is_empty());
    }

    if missing.is_empty() {
        return Ok(missing);
    }

    fs::create_dir_all(dir).map_err(|e| {
        CellError::infrastructure(role, "Failed to create replica directory", dir, e)
    })?;

    missing.reverse();
    for created in &missing {
        let parent = match created.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fsync_dir(parent, role)?;
    }

    Ok(missing)
}

/// Durably overwrites one replica with `record`.
///
/// 1. Create missing parent directories, durably
/// 2. Truncate and write the full record
/// 3. fsync the file
/// 4. fsync the parent directory
///
/// # Errors
///
/// Returns `TWIN_REPLICA_IO` if any step fails.
pub fn write_replica(path: &Path, role: ReplicaRole, record: &[u8]) -> CellResult<()> {
    maybe_crash(points::before_write(role));

    let result = overwrite(path, role, record);
    if let Err(ref e) = result {
        error!(
            event = %Event::ReplicaIoFailed,
            role = %role,
            path = %path.display(),
            error = %e,
            "replica write failed"
        );
        return result;
    }

    debug!(
        event = %Event::ReplicaWritten,
        role = %role,
        path = %path.display(),
        bytes = record.len(),
        "replica written"
    );
    maybe_crash(points::after_write(role));
    Ok(())
}

fn overwrite(path: &Path, role: ReplicaRole, record: &[u8]) -> CellResult<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());

    if let Some(parent) = parent {
        create_dir_durable(parent, role)?;
    }

    let mut file = File::create(path).map_err(|e| {
        CellError::infrastructure(role, format!("Failed to open {} replica", role), path, e)
    })?;

    #[cfg(feature = "crash-points")]
    if crate::crash_point::crash_point_enabled(points::mid_write(role)) {
        torn_write(&mut file, record);
    }

    file.write_all(record).map_err(|e| {
        CellError::infrastructure(role, format!("Failed to write {} replica", role), path, e)
    })?;

    file.sync_all().map_err(|e| {
        CellError::infrastructure(
            role,
            format!("fsync failed after writing {} replica", role),
            path,
            e,
        )
    })?;

    if let Some(parent) = parent {
        fsync_dir(parent, role)?;
    }

    Ok(())
}

/// Leaves a durable half record behind and aborts.
#[cfg(feature = "crash-points")]
fn torn_write(file: &mut File, record: &[u8]) -> ! {
    let _ = file.write_all(&record[..record.len() / 2]);
    let _ = file.sync_all();
    eprintln!("[CRASH] Triggering torn write");
    std::process::abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::errors::CellErrorCode;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("dir").join("main");
        write_replica(&path, ReplicaRole::Main, b"record").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"record");
    }

    #[test]
    fn test_create_dir_durable_reports_new_levels() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a").join("b").join("c");

        let created = create_dir_durable(&target, ReplicaRole::Backup).unwrap();

        assert!(target.is_dir());
        assert_eq!(
            created,
            vec![
                dir.path().join("a"),
                dir.path().join("a").join("b"),
                target.clone(),
            ]
        );
    }

    #[test]
    fn test_create_dir_durable_stops_at_existing_ancestor() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        let target = dir.path().join("a").join("b");

        let created = create_dir_durable(&target, ReplicaRole::Main).unwrap();
        assert_eq!(created, vec![target.clone()]);

        let again = create_dir_durable(&target, ReplicaRole::Main).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_create_dir_durable_fails_under_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = create_dir_durable(&blocker.join("sub"), ReplicaRole::Main).unwrap_err();
        assert_eq!(err.code(), CellErrorCode::Infrastructure);
    }

    #[cfg(not(feature = "crash-points"))]
    #[test]
    fn test_write_ignores_crash_environment_without_feature() {
        std::env::set_var(crate::crash_point::CRASH_POINT_ENV, points::MAIN_MID_WRITE);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main");

        write_replica(&path, ReplicaRole::Main, b"host record").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"host record");
    }

    #[test]
    fn test_write_truncates_previous_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup");
        write_replica(&path, ReplicaRole::Backup, b"a much longer first record").unwrap();
        write_replica(&path, ReplicaRole::Backup, b"short").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"short");
    }

    #[test]
    fn test_write_empty_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main");
        write_replica(&path, ReplicaRole::Main, b"").unwrap();
        assert_eq!(fs::read(&path).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_write_onto_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main");
        fs::create_dir(&path).unwrap();

        let err = write_replica(&path, ReplicaRole::Main, b"record").unwrap_err();
        assert_eq!(err.code(), CellErrorCode::Infrastructure);
        assert!(err.io_error().is_some());
    }

    #[test]
    fn test_fsync_dir() {
        let dir = TempDir::new().unwrap();
        assert!(fsync_dir(dir.path(), ReplicaRole::Main).is_ok());
    }
}
