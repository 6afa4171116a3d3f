//! Crash point injection for testing durability
//!
//! Crash points exist only when the crate is built with the `crash-points`
//! feature. With it, `TWINFILE_CRASH_POINT` names the active point and the
//! process terminates via `std::process::abort()` when that point is
//! reached: no cleanup, no unwinding, no catching. Without it, every check
//! is a constant no-op and the environment is never read.
//!
//! # Usage
//!
//! ```ignore
//! use twinfile::crash_point::{maybe_crash, points};
//!
//! maybe_crash(points::MAIN_AFTER_WRITE);
//! ```
//!
//! # Testing
//!
//! ```bash
//! cargo test --features crash-points
//! ```

/// Environment variable naming the active crash point
pub const CRASH_POINT_ENV: &str = "TWINFILE_CRASH_POINT";

#[cfg(feature = "crash-points")]
static CRASH_POINT: std::sync::OnceLock<Option<String>> = std::sync::OnceLock::new();

#[cfg(feature = "crash-points")]
#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var(CRASH_POINT_ENV).ok())
        .as_deref()
}

/// Returns true if `TWINFILE_CRASH_POINT` equals the given name.
#[cfg(feature = "crash-points")]
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Always false: crash points are compiled out.
#[cfg(not(feature = "crash-points"))]
#[inline]
pub fn crash_point_enabled(_name: &str) -> bool {
    false
}

/// Aborts the process if the named crash point is enabled.
///
/// No-op when `TWINFILE_CRASH_POINT` is not set or doesn't match, and
/// always a no-op without the `crash-points` feature.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// All defined crash point names
pub mod points {
    use crate::cell::ReplicaRole;

    pub const BACKUP_BEFORE_WRITE: &str = "backup_before_write";
    /// Half of the record is durably written, then the process aborts
    pub const BACKUP_MID_WRITE: &str = "backup_mid_write";
    pub const BACKUP_AFTER_WRITE: &str = "backup_after_write";

    pub const MAIN_BEFORE_WRITE: &str = "main_before_write";
    /// Half of the record is durably written, then the process aborts
    pub const MAIN_MID_WRITE: &str = "main_mid_write";
    pub const MAIN_AFTER_WRITE: &str = "main_after_write";

    pub fn before_write(role: ReplicaRole) -> &'static str {
        match role {
            ReplicaRole::Main => MAIN_BEFORE_WRITE,
            ReplicaRole::Backup => BACKUP_BEFORE_WRITE,
        }
    }

    pub fn mid_write(role: ReplicaRole) -> &'static str {
        match role {
            ReplicaRole::Main => MAIN_MID_WRITE,
            ReplicaRole::Backup => BACKUP_MID_WRITE,
        }
    }

    pub fn after_write(role: ReplicaRole) -> &'static str {
        match role {
            ReplicaRole::Main => MAIN_AFTER_WRITE,
            ReplicaRole::Backup => BACKUP_AFTER_WRITE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::ReplicaRole;

    #[test]
    fn test_crash_point_disabled_by_default() {
        assert!(!crash_point_enabled("test_point"));
        maybe_crash("test_point");
    }

    fn role_points() -> Vec<&'static str> {
        [ReplicaRole::Backup, ReplicaRole::Main]
            .into_iter()
            .flat_map(|role| {
                [
                    points::before_write(role),
                    points::mid_write(role),
                    points::after_write(role),
                ]
            })
            .collect()
    }

    #[test]
    fn test_role_points_are_distinct() {
        let mut all = role_points();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 6);
        assert!(all.contains(&points::MAIN_MID_WRITE));
        assert!(all.contains(&points::BACKUP_BEFORE_WRITE));
    }

    #[test]
    fn test_crash_point_names_are_lowercase_with_underscores() {
        for point in role_points() {
            assert!(
                point.chars().all(|c| c.is_lowercase() || c == '_'),
                "Crash point '{}' should be lowercase with underscores",
                point
            );
        }
    }

    #[cfg(not(feature = "crash-points"))]
    #[test]
    fn test_environment_ignored_without_feature() {
        std::env::set_var(CRASH_POINT_ENV, points::MAIN_AFTER_WRITE);
        assert!(!crash_point_enabled(points::MAIN_AFTER_WRITE));
        maybe_crash(points::MAIN_AFTER_WRITE);
    }
}
