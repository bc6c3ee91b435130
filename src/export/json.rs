//! Full JSON export
//!
//! Dumps every record in the store with a schema version and summary
//! metadata, and reads such a dump back for verification.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ShopError, ShopResult};
use crate::models::{
    Bundle, Estimate, EstimatePublicLink, Invoice, InvoiceSource, InvoiceStatus, Money, Workorder,
};
use crate::storage::{EstimateFilter, InvoiceFilter, Storage, WorkorderFilter};

pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    pub schema_version: String,
    pub exported_at: DateTime<Utc>,
    /// Version of shopfloor that wrote the export
    pub app_version: String,
    pub estimates: Vec<Estimate>,
    pub workorders: Vec<Workorder>,
    pub invoices: Vec<Invoice>,
    pub bundles: Vec<Bundle>,
    /// Links carry only token hashes, never raw tokens
    pub public_links: Vec<EstimatePublicLink>,
    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub estimate_count: usize,
    pub workorder_count: usize,
    pub invoice_count: usize,
    pub bundle_count: usize,
    pub public_link_count: usize,
    /// Balance due across unpaid and partially paid invoices
    pub outstanding_balance: Money,
}

impl FullExport {
    pub fn from_storage(storage: &Storage) -> ShopResult<Self> {
        let mut estimates = storage.estimates.list(&EstimateFilter::default())?;
        estimates.reverse();
        let mut workorders = storage.workorders.list(&WorkorderFilter::default())?;
        workorders.reverse();
        let mut invoices = storage.invoices.list(&InvoiceFilter::default())?;
        invoices.reverse();
        let bundles = storage.bundles.list(true)?;
        let mut public_links = storage.public_links.get_all()?;
        public_links.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let outstanding_balance = invoices
            .iter()
            .filter(|i| matches!(i.status, InvoiceStatus::Unpaid | InvoiceStatus::Partial))
            .map(|i| i.balance_due)
            .sum();

        let metadata = ExportMetadata {
            estimate_count: estimates.len(),
            workorder_count: workorders.len(),
            invoice_count: invoices.len(),
            bundle_count: bundles.len(),
            public_link_count: public_links.len(),
            outstanding_balance,
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            estimates,
            workorders,
            invoices,
            bundles,
            public_links,
            metadata,
        })
    }

    /// Check the schema version and the links between documents
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let estimate_ids: HashSet<_> = self.estimates.iter().map(|e| e.id).collect();
        let workorder_ids: HashSet<_> = self.workorders.iter().map(|w| w.id).collect();
        let invoice_ids: HashSet<_> = self.invoices.iter().map(|i| i.id).collect();

        for estimate in &self.estimates {
            if let Some(id) = estimate.workorder_id {
                if !workorder_ids.contains(&id) {
                    return Err(format!(
                        "Estimate {} references unknown workorder {}",
                        estimate.number, id
                    ));
                }
            }
            if let Some(id) = estimate.invoice_id {
                if !invoice_ids.contains(&id) {
                    return Err(format!(
                        "Estimate {} references unknown invoice {}",
                        estimate.number, id
                    ));
                }
            }
        }

        for workorder in &self.workorders {
            if !estimate_ids.contains(&workorder.estimate_id) {
                return Err(format!(
                    "Workorder {} references unknown estimate {}",
                    workorder.number, workorder.estimate_id
                ));
            }
            if let Some(missing) = workorder
                .sub_estimate_ids
                .iter()
                .find(|id| !estimate_ids.contains(id))
            {
                return Err(format!(
                    "Workorder {} references unknown sub-estimate {}",
                    workorder.number, missing
                ));
            }
        }

        for invoice in &self.invoices {
            let known = match invoice.source {
                InvoiceSource::Estimate(id) => estimate_ids.contains(&id),
                InvoiceSource::Workorder(id) => workorder_ids.contains(&id),
            };
            if !known {
                return Err(format!(
                    "Invoice {} references unknown {}",
                    invoice.number, invoice.source
                ));
            }
        }

        for link in &self.public_links {
            if !estimate_ids.contains(&link.estimate_id) {
                return Err(format!(
                    "Public link {} references unknown estimate {}",
                    link.short_code, link.estimate_id
                ));
            }
        }

        Ok(())
    }
}

pub fn export_full_json<W: Write>(
    storage: &Storage,
    writer: &mut W,
    pretty: bool,
) -> ShopResult<()> {
    let export = FullExport::from_storage(storage)?;
    let result = if pretty {
        serde_json::to_writer_pretty(&mut *writer, &export)
    } else {
        serde_json::to_writer(&mut *writer, &export)
    };
    result.map_err(|e| ShopError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| ShopError::Export(e.to_string()))?;
    Ok(())
}

/// Parse and validate a JSON export
pub fn read_json_export(json: &str) -> ShopResult<FullExport> {
    let export: FullExport =
        serde_json::from_str(json).map_err(|e| ShopError::Export(e.to_string()))?;
    export.validate().map_err(ShopError::Export)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ShopPaths;
    use crate::config::settings::Settings;
    use crate::models::{ItemType, Quantity, WorkorderId};
    use crate::services::{
        EstimateEditorService, EstimateInput, EstimateService, JobInput, LineInput,
    };
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ShopPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn invoiced_estimate(storage: &Storage, settings: &Settings) {
        let estimate = EstimateEditorService::new(storage, settings)
            .create(EstimateInput {
                customer_id: 4,
                vehicle_id: 5,
                jobs: vec![JobInput::new("Battery").with_item(LineInput::new(
                    ItemType::Part,
                    "AGM battery",
                    Quantity::units(1),
                    Money::from_cents(21_000),
                    false,
                ))],
                ..Default::default()
            })
            .unwrap();
        let estimates = EstimateService::new(storage, settings);
        estimates.approve(estimate.id).unwrap();
        estimates.convert_to_invoice(estimate.id).unwrap();
    }

    #[test]
    fn test_full_export() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        invoiced_estimate(&storage, &settings);

        let export = FullExport::from_storage(&storage).unwrap();
        assert_eq!(export.schema_version, EXPORT_SCHEMA_VERSION);
        assert_eq!(export.metadata.estimate_count, 1);
        assert_eq!(export.metadata.invoice_count, 1);
        assert_eq!(export.metadata.outstanding_balance, Money::from_cents(21_000));
        assert!(export.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        invoiced_estimate(&storage, &settings);

        let mut out = Vec::new();
        export_full_json(&storage, &mut out, true).unwrap();
        let imported = read_json_export(&String::from_utf8(out).unwrap()).unwrap();

        assert_eq!(imported.estimates.len(), 1);
        assert_eq!(imported.invoices[0].customer_id, 4);
    }

    #[test]
    fn test_validate_catches_dangling_reference() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        invoiced_estimate(&storage, &settings);

        let mut export = FullExport::from_storage(&storage).unwrap();
        export.estimates[0].workorder_id = Some(WorkorderId::new());
        let err = export.validate().unwrap_err();
        assert!(err.contains("unknown workorder"));

        export.schema_version = "0.1".into();
        assert!(export.validate().unwrap_err().contains("Schema version"));
    }
}
