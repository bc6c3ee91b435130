//! Backup CLI commands

use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use tabled::Tabled;

use crate::backup::{BackupManager, RestoreManager};
use crate::config::paths::ShopPaths;
use crate::config::settings::Settings;
use crate::display::table;
use crate::error::{ShopError, ShopResult};

#[derive(Tabled)]
struct BackupRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Kind")]
    kind: String,
}

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a new backup and prune old ones
    Create,
    /// List available backups
    List {
        /// Show the time of day as well as the date
        #[arg(short, long)]
        detailed: bool,
    },
    /// Restore from a backup
    Restore {
        /// Backup filename or path ('latest' for the most recent)
        backup: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Show what a backup contains
    Info { backup: String },
    /// Delete backups beyond the retention policy
    Prune {
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a backup command
pub fn handle_backup_command(
    paths: &ShopPaths,
    settings: &Settings,
    cmd: BackupCommands,
) -> ShopResult<()> {
    let retention = settings.backup_retention.clone();
    let manager = BackupManager::new(paths.clone(), retention.clone());

    match cmd {
        BackupCommands::Create => {
            let (backup_path, pruned) = manager.create_backup_with_retention()?;
            println!("Backup created: {}", backup_path.display());
            if !pruned.is_empty() {
                println!("Pruned {} old backup(s).", pruned.len());
            }
        }

        BackupCommands::List { detailed } => {
            let backups = manager.list_backups()?;
            if backups.is_empty() {
                println!("No backups yet; run `shopfloor backup create`.");
                return Ok(());
            }

            let now = Utc::now();
            let rows: Vec<BackupRow> = backups
                .iter()
                .map(|b| BackupRow {
                    file: b.filename.clone(),
                    created: if detailed {
                        b.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
                    } else {
                        b.created_at.format("%Y-%m-%d").to_string()
                    },
                    age: format_duration(now.signed_duration_since(b.created_at)),
                    size: format_size(b.size_bytes),
                    kind: if b.is_monthly { "monthly" } else { "daily" }.to_string(),
                })
                .collect();
            print!("{}", table(rows, ""));
            println!("{} backup(s) in {}", backups.len(), manager.backup_dir().display());
        }

        BackupCommands::Restore { backup, force } => {
            let backup_path = resolve_backup_path(&manager, &backup)?;
            let restore = RestoreManager::new(paths.clone());
            let validation = restore.validate_backup(&backup_path)?;

            println!("File: {}", backup_path.display());
            println!(
                "Created: {}",
                validation.backup_date.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("Status: {}", validation.summary());
            println!();

            if !force {
                println!("Restoring replaces every data file. Re-run with --force to continue.");
                return Ok(());
            }

            let safety = manager.create_backup()?;
            println!("Current data saved to: {}", safety.display());

            let result = restore.restore_from_file(&backup_path)?;
            println!("Restore complete. {}", result.summary());
            if !result.all_restored() {
                println!("Note: some data files were not present in the backup.");
            }
        }

        BackupCommands::Info { backup } => {
            let backup_path = resolve_backup_path(&manager, &backup)?;
            let validation = RestoreManager::new(paths.clone()).validate_backup(&backup_path)?;
            let size = std::fs::metadata(&backup_path)?.len();

            println!("File: {}", backup_path.display());
            println!("Size: {}", format_size(size));
            println!(
                "Created: {}",
                validation.backup_date.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("Schema version: {}", validation.schema_version);
            println!("Status: {}", validation.summary());
        }

        BackupCommands::Prune { force } => {
            let backups = manager.list_backups()?;
            let (monthly, daily): (Vec<_>, Vec<_>) = backups.iter().partition(|b| b.is_monthly);
            let excess = daily.len().saturating_sub(retention.daily_count as usize)
                + monthly.len().saturating_sub(retention.monthly_count as usize);

            println!(
                "Retention policy: {} daily, {} monthly",
                retention.daily_count, retention.monthly_count
            );
            if excess == 0 {
                println!("No backups to prune.");
                return Ok(());
            }
            if !force {
                println!("{} backup(s) would be deleted; re-run with --force.", excess);
                return Ok(());
            }
            let deleted = manager.enforce_retention()?;
            println!("Deleted {} backup(s).", deleted.len());
        }
    }

    Ok(())
}

/// Resolve `latest`, a path, or a filename in the backup directory
fn resolve_backup_path(manager: &BackupManager, backup: &str) -> ShopResult<PathBuf> {
    if backup.eq_ignore_ascii_case("latest") {
        return manager
            .get_latest_backup()?
            .map(|b| b.path)
            .ok_or_else(|| ShopError::NotFound {
                entity_type: "Backup",
                identifier: "latest".to_string(),
            });
    }

    let path = PathBuf::from(backup);
    if path.exists() {
        return Ok(path);
    }
    if let Some(info) = manager.get_backup(backup)? {
        return Ok(info.path);
    }
    let with_ext = manager.backup_dir().join(format!("{}.json", backup));
    if with_ext.exists() {
        return Ok(with_ext);
    }

    Err(ShopError::NotFound {
        entity_type: "Backup",
        identifier: backup.to_string(),
    })
}

/// Coarse age such as `42s`, `3h` or `2mo`
fn format_duration(duration: chrono::Duration) -> String {
    const UNITS: [(i64, &str); 4] = [(30 * 86_400, "mo"), (86_400, "d"), (3_600, "h"), (60, "m")];

    let seconds = duration.num_seconds().max(0);
    UNITS
        .iter()
        .find(|(size, _)| seconds >= *size)
        .map(|(size, suffix)| format!("{}{}", seconds / size, suffix))
        .unwrap_or_else(|| format!("{}s", seconds))
}

fn format_size(bytes: u64) -> String {
    match bytes {
        b if b >= 1 << 20 => format!("{:.1} MB", b as f64 / (1u64 << 20) as f64),
        b if b >= 1 << 10 => format!("{:.1} KB", b as f64 / 1024.0),
        b => format!("{} B", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_duration(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_duration(chrono::Duration::hours(50)), "2d");
        assert_eq!(format_duration(chrono::Duration::days(65)), "2mo");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
    }
}
