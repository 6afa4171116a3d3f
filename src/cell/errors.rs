//! Cell error types
//!
//! Error codes:
//! - TWIN_RECORD_FORMAT (ERROR severity) - record shorter than its checksum
//! - TWIN_RECORD_INTEGRITY (ERROR severity) - checksum mismatch
//! - TWIN_REPLICA_IO (FATAL severity) - I/O failure unrelated to content
//! - TWIN_REPLICA_RECOVERED (ERROR severity) - one replica masked by the other
//! - TWIN_REPLICAS_LOST (FATAL severity) - no replica yields a valid payload
//!
//! Every error is tagged with a code and a scope. Whether an error is corrupt
//! or critical is a lookup on the code, never an inspection of the message.

use std::fmt;
use std::io;
use std::path::Path;

use super::config::ReplicaRole;

/// Severity levels for cell errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller may continue, possibly with recovered data
    Error,
    /// No trustworthy data, or the environment is faulty
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Cell error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellErrorCode {
    /// Record too short to contain a checksum
    Format,
    /// Recomputed checksum differs from the stored one
    Integrity,
    /// Read/write/flush failed for reasons other than content
    Infrastructure,
    /// One replica was invalid or absent, the other yielded the payload
    Recovered,
    /// Neither replica yields a payload and at least one is invalid
    Lost,
}

impl CellErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            CellErrorCode::Format => "TWIN_RECORD_FORMAT",
            CellErrorCode::Integrity => "TWIN_RECORD_INTEGRITY",
            CellErrorCode::Infrastructure => "TWIN_REPLICA_IO",
            CellErrorCode::Recovered => "TWIN_REPLICA_RECOVERED",
            CellErrorCode::Lost => "TWIN_REPLICAS_LOST",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            CellErrorCode::Format => Severity::Error,
            CellErrorCode::Integrity => Severity::Error,
            CellErrorCode::Infrastructure => Severity::Fatal,
            CellErrorCode::Recovered => Severity::Error,
            CellErrorCode::Lost => Severity::Fatal,
        }
    }

    /// Whether this code describes damaged on-disk content
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            CellErrorCode::Format
                | CellErrorCode::Integrity
                | CellErrorCode::Recovered
                | CellErrorCode::Lost
        )
    }
}

impl fmt::Display for CellErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Where an error was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// A bare record, not yet attributed to a replica
    Record,
    /// The main replica
    Main,
    /// The backup replica
    Backup,
    /// The reconciled view of both replicas
    Composite,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Record => "record",
            Scope::Main => "main",
            Scope::Backup => "backup",
            Scope::Composite => "composite",
        }
    }
}

impl From<ReplicaRole> for Scope {
    fn from(role: ReplicaRole) -> Self {
        match role {
            ReplicaRole::Main => Scope::Main,
            ReplicaRole::Backup => Scope::Backup,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
enum Cause {
    Io(io::Error),
    Replicas {
        main: Option<Box<CellError>>,
        backup: Option<Box<CellError>>,
    },
}

/// Cell error with code, scope and context
#[derive(Debug)]
pub struct CellError {
    code: CellErrorCode,
    scope: Scope,
    message: String,
    details: Option<String>,
    cause: Option<Cause>,
}

impl CellError {
    /// Record is shorter than the checksum that should end it
    pub fn format(len: usize, check_size: usize) -> Self {
        Self {
            code: CellErrorCode::Format,
            scope: Scope::Record,
            message: "record too short to contain a checksum".to_string(),
            details: Some(format!("record_len: {}, checksum_len: {}", len, check_size)),
            cause: None,
        }
    }

    /// Stored checksum does not match the payload
    pub fn integrity(len: usize) -> Self {
        Self {
            code: CellErrorCode::Integrity,
            scope: Scope::Record,
            message: "checksum mismatch".to_string(),
            details: Some(format!("record_len: {}", len)),
            cause: None,
        }
    }

    /// I/O failure on a replica file
    pub fn infrastructure(
        role: ReplicaRole,
        message: impl Into<String>,
        path: &Path,
        source: io::Error,
    ) -> Self {
        Self {
            code: CellErrorCode::Infrastructure,
            scope: role.into(),
            message: message.into(),
            details: Some(format!("path: {}", path.display())),
            cause: Some(Cause::Io(source)),
        }
    }

    /// One replica failed but the other yielded the payload.
    ///
    /// `failed` is the replica that could not be used; absent replicas carry no error.
    pub fn recovered(failed: ReplicaRole, cause: Option<CellError>) -> Self {
        let cause = cause.map(Box::new);
        let (main, backup) = match failed {
            ReplicaRole::Main => (cause, None),
            ReplicaRole::Backup => (None, cause),
        };
        Self {
            code: CellErrorCode::Recovered,
            scope: Scope::Composite,
            message: format!("{} replica unusable, payload recovered from the other", failed),
            details: None,
            cause: Some(Cause::Replicas { main, backup }),
        }
    }

    /// No replica yields a payload.
    pub fn lost(main: Option<CellError>, backup: Option<CellError>) -> Self {
        Self {
            code: CellErrorCode::Lost,
            scope: Scope::Composite,
            message: "no replica holds a valid record".to_string(),
            details: Some(format!(
                "main: {}, backup: {}",
                describe(main.as_ref()),
                describe(backup.as_ref())
            )),
            cause: Some(Cause::Replicas {
                main: main.map(Box::new),
                backup: backup.map(Box::new),
            }),
        }
    }

    /// Re-attributes a record-level error to a replica.
    pub fn in_replica(mut self, role: ReplicaRole) -> Self {
        self.scope = role.into();
        self
    }

    /// Returns the error code
    pub fn code(&self) -> CellErrorCode {
        self.code
    }

    /// Returns where the error was observed
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// On-disk content is damaged (possibly masked by the other replica)
    pub fn is_corrupt(&self) -> bool {
        self.code.is_corrupt()
    }

    /// No trustworthy payload is available, or the environment failed
    pub fn is_critical(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// The main replica's failure behind a composite error
    pub fn main_cause(&self) -> Option<&CellError> {
        match &self.cause {
            Some(Cause::Replicas { main, .. }) => main.as_deref(),
            _ => None,
        }
    }

    /// The backup replica's failure behind a composite error
    pub fn backup_cause(&self) -> Option<&CellError> {
        match &self.cause {
            Some(Cause::Replicas { backup, .. }) => backup.as_deref(),
            _ => None,
        }
    }

    /// Underlying I/O error of an infrastructure failure
    pub fn io_error(&self) -> Option<&io::Error> {
        match &self.cause {
            Some(Cause::Io(e)) => Some(e),
            _ => None,
        }
    }
}

fn describe(err: Option<&CellError>) -> &'static str {
    match err {
        Some(e) => e.code.code(),
        None => "absent",
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.code.severity(),
            self.code.code(),
            self.scope,
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for CellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.cause {
            Some(Cause::Io(e)) => Some(e),
            Some(Cause::Replicas { main, backup }) => main
                .as_deref()
                .or(backup.as_deref())
                .map(|e| e as &(dyn std::error::Error + 'static)),
            None => None,
        }
    }
}

/// Result type for cell operations
pub type CellResult<T> = Result<T, CellError>;

/// Nil-safe corruption predicate. `None` is never corrupt.
pub fn is_corrupt(err: Option<&CellError>) -> bool {
    err.map_or(false, CellError::is_corrupt)
}

/// Nil-safe criticality predicate. `None` is never critical.
pub fn is_critical(err: Option<&CellError>) -> bool {
    err.map_or(false, CellError::is_critical)
}
