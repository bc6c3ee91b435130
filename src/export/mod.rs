//! Data export
//!
//! - CSV: estimate and invoice registers for spreadsheets
//! - JSON: machine-readable dump of every record
//! - YAML: the same dump in human-readable form

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::{export_estimates_csv, export_invoices_csv};
pub use json::{export_full_json, read_json_export, FullExport, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_full_yaml, read_yaml_export};
