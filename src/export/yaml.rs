//! Full YAML export, the human-readable form of the JSON dump

use std::io::Write;

use crate::error::{ShopError, ShopResult};
use crate::export::json::FullExport;
use crate::storage::Storage;

pub fn export_full_yaml<W: Write>(storage: &Storage, writer: &mut W) -> ShopResult<()> {
    let export = FullExport::from_storage(storage)?;

    let header = format!(
        "# shopfloor full export\n# Generated: {}\n# App version: {}\n\n",
        export.exported_at, export.app_version
    );
    writer
        .write_all(header.as_bytes())
        .map_err(|e| ShopError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| ShopError::Export(e.to_string()))
}

/// Parse and validate a YAML export
pub fn read_yaml_export(yaml: &str) -> ShopResult<FullExport> {
    let export: FullExport =
        serde_yaml::from_str(yaml).map_err(|e| ShopError::Export(e.to_string()))?;
    export.validate().map_err(ShopError::Export)?;
    Ok(export)
}
