//! Dual-replica storage cell
//!
//! A cell persists one opaque byte sequence in two checksummed replica
//! files. After an uncoordinated crash during a write the value can still
//! be recovered, and corruption is distinguished from loss.
//!
//! # Design Principles
//!
//! - Full-file overwrites, no atomic rename, no append log
//! - Backup written and fsynced before main
//! - Main is authoritative whenever valid
//! - Checksum-verified on every read
//! - No repair on read: a corrupt replica is reported, healed by the next write
//!
//! # On-disk layout
//!
//! ```text
//! <dir>/main    payload || checksum
//! <dir>/backup  payload || checksum
//! ```

mod checksum;
mod config;
mod errors;
mod reader;
mod record;
mod store;
mod writer;

pub use checksum::ChecksumKind;
pub use config::{CellConfig, ConfigError, ReplicaRole, DEFAULT_BACKUP_NAME, DEFAULT_MAIN_NAME};
pub use errors::{
    is_corrupt, is_critical, CellError, CellErrorCode, CellResult, Scope, Severity,
};
pub use reader::read_replica;
pub use record::RecordCodec;
pub use store::{OpenOutcome, ReplicaState, Store};
pub use writer::{create_dir_durable, fsync_dir, write_replica};
