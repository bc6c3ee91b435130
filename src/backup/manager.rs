//! Backup creation and retention

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::paths::ShopPaths;
use crate::config::settings::BackupRetention;
use crate::error::{ShopError, ShopResult};
use crate::storage::file_io::read_json_value;

pub(crate) const ARCHIVE_SCHEMA_VERSION: u32 = 1;

/// Metadata about one archive on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupInfo {
    pub filename: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    /// First archive of its calendar month; kept under the monthly allowance
    pub is_monthly: bool,
}

/// Archive format: one untyped copy of each data file
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupArchive {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub estimates: serde_json::Value,
    #[serde(default)]
    pub workorders: serde_json::Value,
    #[serde(default)]
    pub invoices: serde_json::Value,
    #[serde(default)]
    pub bundles: serde_json::Value,
    #[serde(default)]
    pub public_links: serde_json::Value,
}

impl BackupArchive {
    /// Snapshot the data files under `paths`; missing files become `null`
    pub fn capture(paths: &ShopPaths, created_at: DateTime<Utc>) -> ShopResult<Self> {
        Ok(Self {
            schema_version: ARCHIVE_SCHEMA_VERSION,
            created_at,
            estimates: read_json_value(paths.estimates_file())?,
            workorders: read_json_value(paths.workorders_file())?,
            invoices: read_json_value(paths.invoices_file())?,
            bundles: read_json_value(paths.bundles_file())?,
            public_links: read_json_value(paths.public_links_file())?,
        })
    }

    /// Each section with the name it is reported under and its data file
    pub fn sections(&self, paths: &ShopPaths) -> [(&'static str, &serde_json::Value, PathBuf); 5] {
        [
            ("estimates", &self.estimates, paths.estimates_file()),
            ("workorders", &self.workorders, paths.workorders_file()),
            ("invoices", &self.invoices, paths.invoices_file()),
            ("bundles", &self.bundles, paths.bundles_file()),
            ("public_links", &self.public_links, paths.public_links_file()),
        ]
    }
}

pub struct BackupManager {
    backup_dir: PathBuf,
    paths: ShopPaths,
    retention: BackupRetention,
}

impl BackupManager {
    pub fn new(paths: ShopPaths, retention: BackupRetention) -> Self {
        let backup_dir = paths.backup_dir();
        Self {
            backup_dir,
            paths,
            retention,
        }
    }

    /// Write a new archive and return its path
    pub fn create_backup(&self) -> ShopResult<PathBuf> {
        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| ShopError::Io(format!("Failed to create backup directory: {}", e)))?;

        let now = Utc::now();
        let filename = format!(
            "backup-{}-{:03}.json",
            now.format("%Y%m%d-%H%M%S"),
            now.timestamp_subsec_millis()
        );
        let backup_path = self.backup_dir.join(&filename);

        let archive = BackupArchive::capture(&self.paths, now)?;
        let json = serde_json::to_string_pretty(&archive)
            .map_err(|e| ShopError::Json(format!("Failed to serialize backup: {}", e)))?;
        fs::write(&backup_path, json)
            .map_err(|e| ShopError::Io(format!("Failed to write backup file: {}", e)))?;

        info!(backup = %filename, "backup created");
        Ok(backup_path)
    }

    /// Archives in the backup directory, newest first
    pub fn list_backups(&self) -> ShopResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        let entries = fs::read_dir(&self.backup_dir)
            .map_err(|e| ShopError::Io(format!("Failed to read backup directory: {}", e)))?;
        for entry in entries {
            let entry = entry
                .map_err(|e| ShopError::Io(format!("Failed to read directory entry: {}", e)))?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                if let Some(info) = parse_backup_info(&path) {
                    backups.push(info);
                }
            }
        }

        backups.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let mut last_month = None;
        for backup in &mut backups {
            let month = (backup.created_at.year(), backup.created_at.month());
            backup.is_monthly = last_month != Some(month);
            last_month = Some(month);
        }
        backups.reverse();

        Ok(backups)
    }

    /// Delete archives beyond the retention allowances; returns what was removed
    pub fn enforce_retention(&self) -> ShopResult<Vec<PathBuf>> {
        let (monthly, daily): (Vec<_>, Vec<_>) =
            self.list_backups()?.into_iter().partition(|b| b.is_monthly);

        let expired = daily
            .into_iter()
            .skip(self.retention.daily_count as usize)
            .chain(monthly.into_iter().skip(self.retention.monthly_count as usize));

        let mut deleted = Vec::new();
        for backup in expired {
            fs::remove_file(&backup.path)
                .map_err(|e| ShopError::Io(format!("Failed to delete old backup: {}", e)))?;
            debug!(backup = %backup.filename, "pruned backup");
            deleted.push(backup.path);
        }
        Ok(deleted)
    }

    pub fn create_backup_with_retention(&self) -> ShopResult<(PathBuf, Vec<PathBuf>)> {
        let backup_path = self.create_backup()?;
        let deleted = self.enforce_retention()?;
        Ok((backup_path, deleted))
    }

    pub fn backup_dir(&self) -> &PathBuf {
        &self.backup_dir
    }

    /// Look up an archive by filename
    pub fn get_backup(&self, filename: &str) -> ShopResult<Option<BackupInfo>> {
        Ok(self
            .list_backups()?
            .into_iter()
            .find(|b| b.filename == filename))
    }

    pub fn get_latest_backup(&self) -> ShopResult<Option<BackupInfo>> {
        Ok(self.list_backups()?.into_iter().next())
    }
}

fn parse_backup_info(path: &Path) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    let stamp = filename.strip_prefix("backup-")?.strip_suffix(".json")?;
    let created_at = parse_backup_timestamp(stamp)?;
    let size_bytes = fs::metadata(path).ok()?.len();

    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes,
        is_monthly: false,
    })
}

/// Parse `YYYYMMDD-HHMMSS` with an optional `-mmm` millisecond suffix
fn parse_backup_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    let mut parts = stamp.split('-');
    let date = NaiveDate::parse_from_str(parts.next()?, "%Y%m%d").ok()?;
    let time = NaiveTime::parse_from_str(parts.next()?, "%H%M%S").ok()?;
    let millis: u32 = match parts.next() {
        Some(ms) => ms.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    let time = time.with_nanosecond(millis.checked_mul(1_000_000)?)?;
    Some(NaiveDateTime::new(date, time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_manager() -> (BackupManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ShopPaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();

        let retention = BackupRetention {
            daily_count: 3,
            monthly_count: 2,
        };
        (BackupManager::new(paths, retention), temp_dir)
    }

    fn touch(manager: &BackupManager, stamp: &str) {
        fs::create_dir_all(manager.backup_dir()).unwrap();
        fs::write(manager.backup_dir().join(format!("backup-{}.json", stamp)), "{}").unwrap();
    }

    #[test]
    fn test_create_backup_captures_data_files() {
        let (manager, _temp) = create_test_manager();
        fs::write(manager.paths.estimates_file(), r#"{"records":[]}"#).unwrap();

        let path = manager.create_backup().unwrap();
        let archive: BackupArchive =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(archive.schema_version, ARCHIVE_SCHEMA_VERSION);
        assert!(archive.estimates["records"].is_array());
        assert!(archive.invoices.is_null());
    }

    #[test]
    fn test_list_backups_newest_first() {
        let (manager, _temp) = create_test_manager();
        touch(&manager, "20260301-080000");
        touch(&manager, "20260302-080000-250");
        touch(&manager, "not-a-backup");

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].filename, "backup-20260302-080000-250.json");
        assert_eq!(backups[0].created_at.nanosecond(), 250_000_000);
        assert!(backups[1].is_monthly);
        assert!(!backups[0].is_monthly);
    }

    #[test]
    fn test_retention_keeps_recent_and_monthly() {
        let (manager, _temp) = create_test_manager();
        for stamp in [
            "20260105-090000",
            "20260201-090000",
            "20260301-090000",
            "20260302-090000",
            "20260303-090000",
            "20260304-090000",
            "20260305-090000",
        ] {
            touch(&manager, stamp);
        }

        let deleted = manager.enforce_retention().unwrap();
        // One surplus daily archive and the oldest monthly one
        assert_eq!(deleted.len(), 2);

        let kept: Vec<_> = manager
            .list_backups()
            .unwrap()
            .into_iter()
            .map(|b| b.filename)
            .collect();
        assert!(kept.contains(&"backup-20260201-090000.json".to_string()));
        assert!(!kept.contains(&"backup-20260105-090000.json".to_string()));
        assert!(!kept.contains(&"backup-20260302-090000.json".to_string()));
    }

    #[test]
    fn test_latest_and_lookup() {
        let (manager, _temp) = create_test_manager();
        assert!(manager.get_latest_backup().unwrap().is_none());

        let path = manager.create_backup().unwrap();
        let latest = manager.get_latest_backup().unwrap().unwrap();
        assert_eq!(latest.path, path);
        assert!(manager.get_backup(&latest.filename).unwrap().is_some());
        assert!(manager.get_backup("backup-missing.json").unwrap().is_none());
    }

    #[test]
    fn test_parse_backup_timestamp() {
        let ts = parse_backup_timestamp("20251127-143022").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2025, 11, 27));
        assert!(parse_backup_timestamp("20251127-143022-456").is_some());
        assert!(parse_backup_timestamp("20251127").is_none());
        assert!(parse_backup_timestamp("20251327-143022").is_none());
    }
}
