//! Bundle model
//!
//! A bundle is a reusable set of line items (e.g. "Synthetic oil change")
//! that can be expanded into a new job on an estimate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::estimate::{EstimateItem, EstimateJob};
use super::ids::BundleId;
use super::line_item::{validate_line, ItemType, PricedLine};
use super::money::{Money, Quantity};

/// Template line inside a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleItem {
    pub item_type: ItemType,
    pub description: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    #[serde(default)]
    pub taxable: bool,
}

impl PricedLine for BundleItem {
    fn item_type(&self) -> ItemType {
        self.item_type
    }
    fn quantity(&self) -> Quantity {
        self.quantity
    }
    fn unit_price(&self) -> Money {
        self.unit_price
    }
    fn taxable(&self) -> bool {
        self.taxable
    }
}

/// A preset bundle of line items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub id: BundleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub service_type: Option<String>,
    pub items: Vec<BundleItem>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Bundle {
    pub fn new(name: impl Into<String>, items: Vec<BundleItem>) -> Self {
        let now = Utc::now();
        Self {
            id: BundleId::new(),
            name: name.into(),
            description: String::new(),
            service_type: None,
            items,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pre-tax value of the bundle, for listings
    pub fn list_price(&self) -> Money {
        self.items.iter().map(|i| i.signed_total()).sum()
    }

    /// Expand into a fresh estimate job with pending items
    pub fn to_job(&self) -> EstimateJob {
        let mut job = EstimateJob::new(self.name.clone());
        job.service_type = self.service_type.clone();
        job.items = self
            .items
            .iter()
            .map(|i| {
                EstimateItem::new(
                    i.item_type,
                    i.description.clone(),
                    i.quantity,
                    i.unit_price,
                    i.taxable,
                )
            })
            .collect();
        job
    }

    pub fn validate(&self) -> Result<(), BundleValidationError> {
        if self.name.trim().is_empty() {
            return Err(BundleValidationError::EmptyName);
        }
        if self.items.is_empty() {
            return Err(BundleValidationError::NoItems);
        }
        for item in &self.items {
            validate_line(&item.description, item.quantity, item.unit_price)
                .map_err(BundleValidationError::InvalidItem)?;
        }
        Ok(())
    }
}

/// Validation errors for bundles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleValidationError {
    EmptyName,
    NoItems,
    InvalidItem(String),
}

impl fmt::Display for BundleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Bundle name cannot be empty"),
            Self::NoItems => write!(f, "Bundle must contain at least one item"),
            Self::InvalidItem(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for BundleValidationError {}
