//! Service layer for shopfloor
//!
//! Services validate requests, apply lifecycle rules to the models, persist
//! through the repositories and write the audit trail. Each borrows the
//! `Storage` coordinator (and `Settings` where numbering or defaults are
//! involved) for the duration of one operation.

pub mod bundle;
pub mod estimate;
pub mod estimate_editor;
pub mod invoice;
pub mod public_link;
pub mod workorder;

pub use bundle::{BundleInput, BundleService};
pub use estimate::EstimateService;
pub use estimate_editor::{EstimateEditorService, EstimateInput, ItemInput, JobInput};
pub use invoice::InvoiceService;
pub use public_link::{EstimatePublicLinkService, IssuedLink};
pub use workorder::WorkorderService;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{ShopError, ShopResult};
use crate::models::line_item::validate_line;
use crate::models::{Estimate, ItemType, Money, Quantity};

/// The priced content of a line, as supplied by a caller
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LineInput {
    pub item_type: ItemType,
    pub description: String,
    #[serde(default)]
    pub quantity: Quantity,
    pub unit_price: Money,
    #[serde(default)]
    pub taxable: bool,
}

impl LineInput {
    pub fn new(
        item_type: ItemType,
        description: impl Into<String>,
        quantity: Quantity,
        unit_price: Money,
        taxable: bool,
    ) -> Self {
        Self {
            item_type,
            description: description.into(),
            quantity,
            unit_price,
            taxable,
        }
    }

    pub fn validate(&self) -> ShopResult<()> {
        validate_line(&self.description, self.quantity, self.unit_price)
            .map_err(ShopError::Validation)
    }
}

/// The shop's calendar date
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Refuse any change to an estimate that has moved on to a workorder or
/// invoice
pub(crate) fn ensure_unlocked(estimate: &Estimate) -> ShopResult<()> {
    if !estimate.is_locked() {
        return Ok(());
    }
    let holder = match (estimate.workorder_id, estimate.invoice_id) {
        (Some(id), _) => format!("workorder {}", id),
        (None, Some(id)) => format!("invoice {}", id),
        (None, None) => "conversion".to_string(),
    };
    Err(ShopError::Locked(format!(
        "Estimate {} is held by {} and is read-only",
        estimate.number, holder
    )))
}
