//! Backups of the shop data
//!
//! `BackupManager` writes dated JSON archives holding every data file and
//! prunes them by the retention policy in the settings: a number of recent
//! archives plus the first archive of each month for longer. `RestoreManager`
//! validates an archive and writes its contents back over the data files.
//!
//! ```rust,ignore
//! use shopfloor::backup::{BackupManager, RestoreManager};
//!
//! let manager = BackupManager::new(paths.clone(), settings.backup_retention.clone());
//! let (archive, pruned) = manager.create_backup_with_retention()?;
//! let result = RestoreManager::new(paths).restore_from_file(&archive)?;
//! println!("{}", result.summary());
//! ```

mod manager;
mod restore;

pub use manager::{BackupArchive, BackupInfo, BackupManager};
pub use restore::{RestoreManager, RestoreResult, ValidationResult};
