//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod audit;
pub mod backup;
pub mod bundle;
pub mod estimate;
pub mod export;
pub mod invoice;
pub mod job;
pub mod link;
pub mod portal;
pub mod workorder;

pub use audit::{handle_audit_command, AuditCommands};
pub use backup::{handle_backup_command, BackupCommands};
pub use bundle::{handle_bundle_command, BundleCommands};
pub use estimate::{handle_estimate_command, EstimateCommands};
pub use export::{handle_export_command, ExportCommands};
pub use invoice::{handle_invoice_command, InvoiceCommands};
pub use job::{handle_job_command, JobCommands};
pub use link::{handle_link_command, LinkCommands};
pub use portal::{handle_portal_command, PortalCommands};
pub use workorder::{handle_workorder_command, WorkorderCommands};

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use clap::Args;
use serde::de::DeserializeOwned;

use crate::error::{ShopError, ShopResult};
use crate::models::{ItemType, Money, Quantity};
use crate::services::LineInput;

/// Flags describing one priced line
#[derive(Args, Debug, Clone)]
pub struct LineArgs {
    /// Item type (labor, part, fee, discount)
    #[arg(short = 't', long = "type")]
    pub item_type: String,
    /// Description shown to the customer
    #[arg(short, long)]
    pub description: String,
    /// Quantity, up to two decimals (e.g. "1.5")
    #[arg(short, long, default_value = "1")]
    pub quantity: String,
    /// Unit price (e.g. "89.99")
    #[arg(short, long)]
    pub price: String,
    /// Charge sales tax on this line
    #[arg(long)]
    pub taxable: bool,
}

impl LineArgs {
    pub fn into_line(self) -> ShopResult<LineInput> {
        Ok(LineInput::new(
            parse_item_type(&self.item_type)?,
            self.description,
            parse_quantity(&self.quantity)?,
            parse_money(&self.price)?,
            self.taxable,
        ))
    }
}

pub(crate) fn parse_money(s: &str) -> ShopResult<Money> {
    Money::parse(s).map_err(|e| ShopError::Validation(format!("Invalid amount '{}': {}", s, e)))
}

pub(crate) fn parse_quantity(s: &str) -> ShopResult<Quantity> {
    Quantity::parse(s)
        .map_err(|e| ShopError::Validation(format!("Invalid quantity '{}': {}", s, e)))
}

pub(crate) fn parse_item_type(s: &str) -> ShopResult<ItemType> {
    ItemType::parse(s).ok_or_else(|| {
        ShopError::Validation(format!(
            "Invalid item type: '{}'. Valid types: labor, part, fee, discount",
            s
        ))
    })
}

pub(crate) fn parse_date(s: &str) -> ShopResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ShopError::Validation(format!("Invalid date '{}'. Use YYYY-MM-DD", s)))
}

/// Parse `type:description:quantity:price[:taxable]`, as used by repeated
/// `--item` flags
pub(crate) fn parse_line_spec(spec: &str) -> ShopResult<LineInput> {
    let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
    if !(4..=5).contains(&parts.len()) {
        return Err(ShopError::Validation(format!(
            "Invalid item '{}'. Use type:description:quantity:price[:taxable]",
            spec
        )));
    }
    let taxable = match parts.get(4).map(|f| f.to_lowercase()).as_deref() {
        None | Some("") | Some("n") | Some("no") => false,
        Some("t") | Some("taxable") | Some("yes") => true,
        Some(flag) => {
            return Err(ShopError::Validation(format!(
                "Invalid taxable flag '{}' in item '{}'",
                flag, spec
            )))
        }
    };
    Ok(LineInput::new(
        parse_item_type(parts[0])?,
        parts[1],
        parse_quantity(parts[2])?,
        parse_money(parts[3])?,
        taxable,
    ))
}

/// Read a YAML or JSON document; JSON parses as YAML
pub(crate) fn read_input<T: DeserializeOwned>(path: &Path) -> ShopResult<T> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ShopError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_yaml::from_str(&contents)
        .map_err(|e| ShopError::Validation(format!("Invalid input in {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_spec() {
        let line = parse_line_spec("part:Oil filter:1:12.50:t").unwrap();
        assert_eq!(line.item_type, ItemType::Part);
        assert_eq!(line.description, "Oil filter");
        assert_eq!(line.unit_price, Money::from_cents(1_250));
        assert!(line.taxable);

        let labor = parse_line_spec("labor:Install:1.5:90").unwrap();
        assert_eq!(labor.quantity, Quantity::from_hundredths(150));
        assert!(!labor.taxable);

        assert!(parse_line_spec("part:Oil filter").is_err());
        assert!(parse_line_spec("gizmo:Thing:1:1").is_err());
        assert!(parse_line_spec("part:Thing:1:1:maybe").is_err());
    }

    #[test]
    fn test_read_input_accepts_yaml_and_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let yaml = dir.path().join("line.yaml");
        fs::write(&yaml, "item_type: LABOR\ndescription: Diag\nunit_price: 5000\n").unwrap();
        let line: LineInput = read_input(&yaml).unwrap();
        assert_eq!(line.unit_price, Money::from_cents(5_000));

        let json = dir.path().join("line.json");
        fs::write(
            &json,
            r#"{"item_type":"PART","description":"Bulb","quantity":200,"unit_price":450}"#,
        )
        .unwrap();
        let line: LineInput = read_input(&json).unwrap();
        assert_eq!(line.quantity, Quantity::units(2));
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2026-04-01").is_ok());
        assert!(parse_date("04/01/2026").is_err());
    }
}
