//! twinfile - a crash-tolerant storage cell for a single value
//!
//! One byte sequence is persisted as two checksummed replicas. Opening the
//! cell reconciles them into a payload plus a classified error, so callers
//! can tell a masked single-replica corruption from an unrecoverable loss.
//!
//! ```no_run
//! use twinfile::{is_corrupt, is_critical, Store};
//!
//! let (store, outcome) = Store::open("/var/lib/app/state");
//! if is_critical(outcome.error()) {
//!     // no trustworthy value
//! } else if is_corrupt(outcome.error()) {
//!     // value recovered from the backup replica
//! }
//! store.write(b"new value")?;
//! # Ok::<(), twinfile::CellError>(())
//! ```

pub mod cell;
pub mod crash_point;
pub mod observability;

pub use cell::{
    is_corrupt, is_critical, CellConfig, CellError, CellErrorCode, CellResult, ChecksumKind,
    ConfigError, OpenOutcome, RecordCodec, ReplicaRole, ReplicaState, Scope, Severity, Store,
};
