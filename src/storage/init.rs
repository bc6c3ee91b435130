//! First-run setup
//!
//! Creates the directory layout, writes the settings file and seeds empty
//! data files so backups always have something to archive.

use crate::config::paths::ShopPaths;
use crate::config::settings::Settings;
use crate::error::ShopResult;

use super::file_io::write_json_atomic;

/// Initialize storage for a fresh installation
///
/// Existing settings and data files are left untouched.
pub fn initialize_storage(paths: &ShopPaths, settings: &Settings) -> ShopResult<()> {
    paths.ensure_directories()?;

    if !paths.settings_file().exists() {
        settings.save(paths)?;
    }

    let empty = serde_json::json!({ "records": [] });
    for file in [
        paths.estimates_file(),
        paths.workorders_file(),
        paths.invoices_file(),
        paths.bundles_file(),
        paths.public_links_file(),
    ] {
        if !file.exists() {
            write_json_atomic(&file, &empty)?;
        }
    }

    Ok(())
}
