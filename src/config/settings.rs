//! Shop settings
//!
//! Tax rate, validity windows, document numbering and backup retention.
//! Stored as `config.json`; every field has a serde default so older files
//! keep loading as settings are added.

use serde::{Deserialize, Serialize};

use super::paths::ShopPaths;
use crate::error::ShopError;

/// Backup retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRetention {
    /// Number of daily backups to keep
    pub daily_count: u32,
    /// Number of monthly backups to keep
    pub monthly_count: u32,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self {
            daily_count: 30,
            monthly_count: 12,
        }
    }
}

/// Prefixes used when numbering documents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NumberPrefixes {
    pub estimate: String,
    pub workorder: String,
    pub invoice: String,
}

impl Default for NumberPrefixes {
    fn default() -> Self {
        Self {
            estimate: "EST-".into(),
            workorder: "WO-".into(),
            invoice: "INV-".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub shop_name: String,

    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Sales tax in basis points (825 = 8.25%)
    #[serde(default)]
    pub tax_rate_bps: u32,

    /// Days an estimate stays valid when no expiration date is given
    #[serde(default = "default_estimate_validity_days")]
    pub estimate_validity_days: u32,

    /// Lifetime of customer approval links
    #[serde(default = "default_public_link_ttl_hours")]
    pub public_link_ttl_hours: u32,

    /// Payment terms for new invoices
    #[serde(default = "default_invoice_due_days")]
    pub invoice_due_days: u32,

    #[serde(default)]
    pub prefixes: NumberPrefixes,

    #[serde(default)]
    pub backup_retention: BackupRetention,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_estimate_validity_days() -> u32 {
    30
}

fn default_public_link_ttl_hours() -> u32 {
    72
}

fn default_invoice_due_days() -> u32 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            shop_name: String::new(),
            currency_symbol: default_currency(),
            tax_rate_bps: 0,
            estimate_validity_days: default_estimate_validity_days(),
            public_link_ttl_hours: default_public_link_ttl_hours(),
            invoice_due_days: default_invoice_due_days(),
            prefixes: NumberPrefixes::default(),
            backup_retention: BackupRetention::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or default settings if the file doesn't exist
    pub fn load_or_create(paths: &ShopPaths) -> Result<Self, ShopError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| ShopError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                ShopError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    pub fn save(&self, paths: &ShopPaths) -> Result<(), ShopError> {
        self.validate()?;
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ShopError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| ShopError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ShopError> {
        if self.tax_rate_bps > 10_000 {
            return Err(ShopError::Config(format!(
                "Tax rate of {} basis points exceeds 100%",
                self.tax_rate_bps
            )));
        }
        if self.public_link_ttl_hours == 0 {
            return Err(ShopError::Config(
                "Public link lifetime must be at least one hour".into(),
            ));
        }
        let prefixes = [
            &self.prefixes.estimate,
            &self.prefixes.workorder,
            &self.prefixes.invoice,
        ];
        if prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err(ShopError::Config("Number prefixes cannot be empty".into()));
        }
        Ok(())
    }

    /// Tax rate formatted as a percentage, e.g. "8.25%"
    pub fn tax_rate_display(&self) -> String {
        format!("{}.{:02}%", self.tax_rate_bps / 100, self.tax_rate_bps % 100)
    }
}
