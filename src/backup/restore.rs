//! Restoring data files from an archive

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::paths::ShopPaths;
use crate::error::{ShopError, ShopResult};
use crate::storage::write_json_atomic;

use super::manager::{BackupArchive, ARCHIVE_SCHEMA_VERSION};

pub struct RestoreManager {
    paths: ShopPaths,
}

impl RestoreManager {
    pub fn new(paths: ShopPaths) -> Self {
        Self { paths }
    }

    /// Overwrite the data files with the contents of an archive
    ///
    /// Sections that are `null` in the archive leave the current file alone.
    pub fn restore_from_file(&self, backup_path: &Path) -> ShopResult<RestoreResult> {
        let archive = read_archive(backup_path)?;
        self.restore_from_archive(&archive)
    }

    pub fn restore_from_archive(&self, archive: &BackupArchive) -> ShopResult<RestoreResult> {
        if archive.schema_version > ARCHIVE_SCHEMA_VERSION {
            return Err(ShopError::Storage(format!(
                "Backup schema v{} is newer than this version of shopfloor supports",
                archive.schema_version
            )));
        }
        self.paths.ensure_directories()?;

        let mut restored = Vec::new();
        for (name, data, path) in archive.sections(&self.paths) {
            if data.is_null() {
                warn!(section = name, "backup has no data for section; skipped");
                continue;
            }
            write_json_atomic(&path, data)?;
            restored.push(name);
        }

        info!(sections = restored.len(), "backup restored");
        Ok(RestoreResult {
            schema_version: archive.schema_version,
            backup_date: archive.created_at,
            restored,
        })
    }

    /// Check that a file parses as an archive and report which sections it holds
    pub fn validate_backup(&self, backup_path: &Path) -> ShopResult<ValidationResult> {
        let archive = read_archive(backup_path)?;

        let mut present = Vec::new();
        let mut missing = Vec::new();
        for (name, data, _) in archive.sections(&self.paths) {
            if data.get("records").map_or(false, |r| r.is_array()) {
                present.push(name);
            } else {
                missing.push(name);
            }
        }

        Ok(ValidationResult {
            schema_version: archive.schema_version,
            backup_date: archive.created_at,
            present,
            missing,
        })
    }
}

fn read_archive(path: &Path) -> ShopResult<BackupArchive> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ShopError::Io(format!("Failed to read backup file: {}", e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| ShopError::Json(format!("Failed to parse backup file: {}", e)))
}

#[derive(Debug)]
pub struct RestoreResult {
    pub schema_version: u32,
    pub backup_date: DateTime<Utc>,
    /// Sections written back, in archive order
    pub restored: Vec<&'static str>,
}

impl RestoreResult {
    pub fn all_restored(&self) -> bool {
        self.restored.len() == 5
    }

    pub fn summary(&self) -> String {
        if self.restored.is_empty() {
            "Nothing restored".to_string()
        } else {
            format!("Restored: {}", self.restored.join(", "))
        }
    }
}

#[derive(Debug)]
pub struct ValidationResult {
    pub schema_version: u32,
    pub backup_date: DateTime<Utc>,
    pub present: Vec<&'static str>,
    pub missing: Vec<&'static str>,
}

impl ValidationResult {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_complete() {
            format!("Complete backup (v{})", self.schema_version)
        } else {
            format!(
                "Partial backup (v{}): has {}, missing {}",
                self.schema_version,
                if self.present.is_empty() {
                    "nothing".to_string()
                } else {
                    self.present.join(", ")
                },
                self.missing.join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::manager::BackupManager;
    use crate::config::settings::{BackupRetention, Settings};
    use crate::storage::initialize_storage;
    use tempfile::TempDir;

    fn create_test_env() -> (RestoreManager, BackupManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ShopPaths::with_base_dir(temp_dir.path().to_path_buf());
        initialize_storage(&paths, &Settings::default()).unwrap();

        let backup_manager = BackupManager::new(paths.clone(), BackupRetention::default());
        (RestoreManager::new(paths), backup_manager, temp_dir)
    }

    #[test]
    fn test_restore_overwrites_changes() {
        let (restore, backups, _temp) = create_test_env();
        let backup_path = backups.create_backup().unwrap();

        fs::write(restore.paths.bundles_file(), r#"{"records":[{"bogus":true}]}"#).unwrap();
        let result = restore.restore_from_file(&backup_path).unwrap();

        assert!(result.all_restored());
        let bundles: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(restore.paths.bundles_file()).unwrap())
                .unwrap();
        assert_eq!(bundles["records"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_restore_recreates_missing_data_dir() {
        let (restore, backups, _temp) = create_test_env();
        let backup_path = backups.create_backup().unwrap();

        fs::remove_dir_all(restore.paths.data_dir()).unwrap();
        restore.restore_from_file(&backup_path).unwrap();

        assert!(restore.paths.estimates_file().exists());
        assert!(restore.paths.public_links_file().exists());
    }

    #[test]
    fn test_validate_backup() {
        let (restore, backups, _temp) = create_test_env();
        let backup_path = backups.create_backup().unwrap();

        let result = restore.validate_backup(&backup_path).unwrap();
        assert!(result.is_complete());
        assert!(result.summary().starts_with("Complete backup"));
    }

    #[test]
    fn test_partial_archive() {
        let (restore, _backups, temp) = create_test_env();
        let path = temp.path().join("partial.json");
        fs::write(
            &path,
            r#"{"schema_version":1,"created_at":"2026-03-01T08:00:00Z","estimates":{"records":[]}}"#,
        )
        .unwrap();

        let validation = restore.validate_backup(&path).unwrap();
        assert_eq!(validation.present, vec!["estimates"]);
        assert!(validation.summary().contains("missing workorders"));

        let result = restore.restore_from_file(&path).unwrap();
        assert_eq!(result.summary(), "Restored: estimates");
        assert!(!result.all_restored());
    }

    #[test]
    fn test_newer_schema_refused() {
        let (restore, _backups, temp) = create_test_env();
        let path = temp.path().join("future.json");
        fs::write(&path, r#"{"schema_version":99,"created_at":"2026-03-01T08:00:00Z"}"#).unwrap();

        assert!(restore.restore_from_file(&path).is_err());
    }
}
