//! Dual-replica store
//!
//! A store is a directory holding two replicas of one record. Writes go to
//! the backup first and the main last, each fsynced before the next starts.
//! Reads trust the main whenever it is valid and fall back to the backup
//! only to mask a main that is absent or invalid.
//!
//! # Crash reasoning
//!
//! - Interrupted backup write: main still holds the previous value.
//! - Interrupted main write: backup already holds the new value, so the
//!   next open recovers it with a non-critical error.
//!
//! # Reconciliation
//!
//! | Main           | Backup         | Result                         |
//! |----------------|----------------|--------------------------------|
//! | Absent         | Absent         | no payload, no error           |
//! | Valid(p)       | any            | p, no error                    |
//! | Absent/Invalid | Valid(p)       | p, `TWIN_REPLICA_RECOVERED`    |
//! | Absent/Invalid | Absent/Invalid | no payload, `TWIN_REPLICAS_LOST` |
//! | I/O failure on either side      || `TWIN_REPLICA_IO`, never masked |

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::config::{CellConfig, ConfigError, ReplicaRole};
use super::errors::{CellError, CellResult};
use super::reader::read_replica;
use super::record::RecordCodec;
use super::writer::write_replica;
use crate::observability::Event;

/// Classification of one replica after a read.
#[derive(Debug)]
pub enum ReplicaState {
    /// File does not exist
    Absent,
    /// Record decoded, holding this payload
    Valid(Vec<u8>),
    /// File exists but fails format or integrity checks
    Invalid(CellError),
}

impl ReplicaState {
    pub fn is_valid(&self) -> bool {
        matches!(self, ReplicaState::Valid(_))
    }
}

/// Result of opening a store: best-effort payload plus classified error.
///
/// A payload may be paired with a non-critical error (recovered from backup).
#[derive(Debug, Default)]
pub struct OpenOutcome {
    payload: Option<Vec<u8>>,
    error: Option<CellError>,
}

impl OpenOutcome {
    fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            payload,
            error: None,
        }
    }

    fn failed(payload: Option<Vec<u8>>, error: CellError) -> Self {
        Self {
            payload,
            error: Some(error),
        }
    }

    /// The recovered payload, if any replica yielded one.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    pub fn error(&self) -> Option<&CellError> {
        self.error.as_ref()
    }

    /// Neither replica exists and nothing went wrong.
    pub fn is_fresh(&self) -> bool {
        self.payload.is_none() && self.error.is_none()
    }

    pub fn is_corrupt(&self) -> bool {
        super::errors::is_corrupt(self.error.as_ref())
    }

    pub fn is_critical(&self) -> bool {
        super::errors::is_critical(self.error.as_ref())
    }

    pub fn into_payload(self) -> Option<Vec<u8>> {
        self.payload
    }

    pub fn into_parts(self) -> (Option<Vec<u8>>, Option<CellError>) {
        (self.payload, self.error)
    }

    /// Strict view: any error, even a recovered one, becomes `Err`.
    pub fn into_result(self) -> CellResult<Option<Vec<u8>>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.payload),
        }
    }
}

/// A single-value storage cell backed by two replica files.
///
/// Holds only paths and configuration; every operation does fresh I/O.
/// There is no locking: callers must not point two writers at one directory.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
    main_path: PathBuf,
    backup_path: PathBuf,
    codec: RecordCodec,
    config: CellConfig,
}

impl Store {
    /// Opens the store at `dir` with the default configuration.
    ///
    /// Does not create `dir`; the store may be fresh.
    pub fn open(dir: impl AsRef<Path>) -> (Self, OpenOutcome) {
        let store = Self::with_valid_config(dir.as_ref(), CellConfig::default());
        let outcome = store.load();
        (store, outcome)
    }

    /// Opens the store at `dir` with a custom configuration.
    pub fn open_with_config(
        dir: impl AsRef<Path>,
        config: CellConfig,
    ) -> Result<(Self, OpenOutcome), ConfigError> {
        let store = Self::new(dir, config)?;
        let outcome = store.load();
        Ok((store, outcome))
    }

    /// Binds a store to `dir` without touching the filesystem.
    pub fn new(dir: impl AsRef<Path>, config: CellConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(dir.as_ref(), config))
    }

    fn with_valid_config(dir: &Path, config: CellConfig) -> Self {
        Self {
            dir: dir.to_path_buf(),
            main_path: dir.join(config.file_name(ReplicaRole::Main)),
            backup_path: dir.join(config.file_name(ReplicaRole::Backup)),
            codec: RecordCodec::new(config.checksum),
            config,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn main_path(&self) -> &Path {
        &self.main_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    pub fn path_of(&self, role: ReplicaRole) -> &Path {
        match role {
            ReplicaRole::Main => &self.main_path,
            ReplicaRole::Backup => &self.backup_path,
        }
    }

    pub fn config(&self) -> &CellConfig {
        &self.config
    }

    /// Reads one replica and passes it through the record codec.
    fn classify(&self, role: ReplicaRole) -> CellResult<ReplicaState> {
        let state = match read_replica(self.path_of(role), role)? {
            None => ReplicaState::Absent,
            Some(bytes) => match self.codec.decode(&bytes) {
                Ok(payload) => ReplicaState::Valid(payload),
                Err(e) => ReplicaState::Invalid(e.in_replica(role)),
            },
        };
        Ok(state)
    }

    /// Classifies both replicas without reconciling them.
    ///
    /// Infrastructure failures on either side are returned as `Err`.
    pub fn replica_states(&self) -> CellResult<(ReplicaState, ReplicaState)> {
        let main = self.classify(ReplicaRole::Main)?;
        let backup = self.classify(ReplicaRole::Backup)?;
        Ok((main, backup))
    }

    /// Reads both replicas once and reconciles them.
    ///
    /// Never writes: a corrupt replica is reported, not repaired.
    pub fn load(&self) -> OpenOutcome {
        let main = self.classify(ReplicaRole::Main);
        let backup = self.classify(ReplicaRole::Backup);

        let (main, backup) = match (main, backup) {
            (Ok(main), Ok(backup)) => (main, backup),
            (Err(e), _) | (_, Err(e)) => return OpenOutcome::failed(None, e),
        };

        let outcome = reconcile(main, backup);
        self.log_outcome(&outcome);
        outcome
    }

    fn log_outcome(&self, outcome: &OpenOutcome) {
        let dir = self.dir.display();
        match (outcome.payload(), outcome.error()) {
            (None, None) => info!(event = %Event::StoreFresh, dir = %dir, "store is fresh"),
            (Some(p), None) => {
                debug!(event = %Event::StoreLoaded, dir = %dir, bytes = p.len(), "store loaded")
            }
            (Some(p), Some(e)) => warn!(
                event = %Event::ReplicaRecovered,
                dir = %dir,
                bytes = p.len(),
                error = %e,
                "replica corruption masked"
            ),
            (None, Some(e)) => error!(
                event = %Event::ReplicasLost,
                dir = %dir,
                code = %e.code(),
                error = %e,
                "no valid replica"
            ),
        }
    }

    /// Durably writes `payload` to both replicas, backup first.
    ///
    /// # Returns
    ///
    /// The number of payload bytes written.
    ///
    /// # Errors
    ///
    /// Returns `TWIN_REPLICA_IO` from the first replica write that fails.
    /// If the backup fails, the main is left untouched.
    pub fn write(&self, payload: &[u8]) -> CellResult<usize> {
        let record = self.codec.encode(payload);

        for role in [ReplicaRole::Backup, ReplicaRole::Main] {
            if let Err(e) = write_replica(self.path_of(role), role, &record) {
                warn!(
                    event = %Event::WriteAborted,
                    dir = %self.dir.display(),
                    role = %role,
                    "write stopped before both replicas were updated"
                );
                return Err(e);
            }
        }

        debug!(
            event = %Event::WriteCommitted,
            dir = %self.dir.display(),
            bytes = payload.len(),
            checksum = self.codec.checksum().as_str(),
            "write committed"
        );
        Ok(payload.len())
    }
}

fn reconcile(main: ReplicaState, backup: ReplicaState) -> OpenOutcome {
    match (main, backup) {
        (ReplicaState::Absent, ReplicaState::Absent) => OpenOutcome::ok(None),
        (ReplicaState::Valid(p), _) => OpenOutcome::ok(Some(p)),
        (ReplicaState::Absent, ReplicaState::Valid(p)) => {
            OpenOutcome::failed(Some(p), CellError::recovered(ReplicaRole::Main, None))
        }
        (ReplicaState::Invalid(e), ReplicaState::Valid(p)) => {
            OpenOutcome::failed(Some(p), CellError::recovered(ReplicaRole::Main, Some(e)))
        }
        (main, backup) => {
            OpenOutcome::failed(None, CellError::lost(into_error(main), into_error(backup)))
        }
    }
}

fn into_error(state: ReplicaState) -> Option<CellError> {
    match state {
        ReplicaState::Invalid(e) => Some(e),
        _ => None,
    }
}
