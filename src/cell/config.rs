//! Construction-time configuration of a cell
//!
//! Replica file names and the checksum algorithm are fixed for the lifetime
//! of a `Store`. There is no process-wide state.

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::checksum::ChecksumKind;

/// Default file name of the main replica
pub const DEFAULT_MAIN_NAME: &str = "main";
/// Default file name of the backup replica
pub const DEFAULT_BACKUP_NAME: &str = "backup";

/// The two replicas of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplicaRole {
    /// Written last, authoritative whenever valid
    Main,
    /// Written first, consulted only when main is unusable
    Backup,
}

impl ReplicaRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicaRole::Main => "main",
            ReplicaRole::Backup => "backup",
        }
    }
}

impl fmt::Display for ReplicaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invalid cell configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{role} replica file name is empty")]
    EmptyName { role: ReplicaRole },

    #[error("{role} replica file name '{name}' must be a single path component")]
    NotAFileName { role: ReplicaRole, name: String },

    #[error("main and backup replicas share the file name '{0}'")]
    SameName(String),
}

/// Cell configuration.
///
/// Deserializable so a host can embed it in its own configuration; missing
/// fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellConfig {
    /// File name of the main replica inside the cell directory
    pub main_name: String,
    /// File name of the backup replica inside the cell directory
    pub backup_name: String,
    /// Digest appended to every record
    pub checksum: ChecksumKind,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            main_name: DEFAULT_MAIN_NAME.to_string(),
            backup_name: DEFAULT_BACKUP_NAME.to_string(),
            checksum: ChecksumKind::default(),
        }
    }
}

impl CellConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets both replica file names.
    pub fn with_replica_names(
        mut self,
        main: impl Into<String>,
        backup: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        self.main_name = main.into();
        self.backup_name = backup.into();
        self.validate()?;
        Ok(self)
    }

    /// Sets the checksum algorithm.
    pub fn with_checksum(mut self, checksum: ChecksumKind) -> Self {
        self.checksum = checksum;
        self
    }

    /// File name of the given replica.
    pub fn file_name(&self, role: ReplicaRole) -> &str {
        match role {
            ReplicaRole::Main => &self.main_name,
            ReplicaRole::Backup => &self.backup_name,
        }
    }

    /// Checks that both names are distinct, non-empty, single file names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for role in [ReplicaRole::Main, ReplicaRole::Backup] {
            validate_name(role, self.file_name(role))?;
        }
        if self.main_name == self.backup_name {
            return Err(ConfigError::SameName(self.main_name.clone()));
        }
        Ok(())
    }
}

fn validate_name(role: ReplicaRole, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::EmptyName { role });
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == name => Ok(()),
        _ => Err(ConfigError::NotAFileName {
            role,
            name: name.to_string(),
        }),
    }
}
