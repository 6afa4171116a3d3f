//! Observable events of a cell
//!
//! Events are explicit and typed. They are emitted as the `event` field of
//! `tracing` records; installing a subscriber is left to the host.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A replica file was read (or found absent)
    ReplicaRead,
    /// Open found no replica at all
    StoreFresh,
    /// Open returned the main replica's payload without error
    StoreLoaded,
    /// Open masked an unusable replica with the other one
    ReplicaRecovered,
    /// Open found no valid replica (FATAL)
    ReplicasLost,
    /// A replica could not be read or written (FATAL)
    ReplicaIoFailed,
    /// A replica was durably overwritten
    ReplicaWritten,
    /// Both replicas hold the new record
    WriteCommitted,
    /// A write stopped before both replicas were updated
    WriteAborted,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ReplicaRead => "REPLICA_READ",
            Event::StoreFresh => "STORE_FRESH",
            Event::StoreLoaded => "STORE_LOADED",
            Event::ReplicaRecovered => "REPLICA_RECOVERED",
            Event::ReplicasLost => "REPLICAS_LOST",
            Event::ReplicaIoFailed => "REPLICA_IO_FAILED",
            Event::ReplicaWritten => "REPLICA_WRITTEN",
            Event::WriteCommitted => "WRITE_COMMITTED",
            Event::WriteAborted => "WRITE_ABORTED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
