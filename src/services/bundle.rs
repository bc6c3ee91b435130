//! Bundle service
//!
//! Preset groups of labor, parts, fees and discounts that can be dropped
//! onto an estimate as a new job.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::error::{ShopError, ShopResult};
use crate::models::{Bundle, BundleId, BundleItem, Estimate, EstimateId, JobId};
use crate::storage::Storage;

use super::estimate_editor::EstimateEditorService;
use super::LineInput;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BundleInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub items: Vec<LineInput>,
}

impl BundleInput {
    fn into_items(self) -> Vec<BundleItem> {
        self.items
            .into_iter()
            .map(|line| BundleItem {
                item_type: line.item_type,
                description: line.description.trim().to_string(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                taxable: line.taxable,
            })
            .collect()
    }
}

pub struct BundleService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> BundleService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    pub fn create(&self, input: BundleInput) -> ShopResult<Bundle> {
        let name = input.name.trim().to_string();
        if self.storage.bundles.name_exists(&name, None)? {
            return Err(ShopError::Duplicate {
                entity_type: "Bundle",
                identifier: name,
            });
        }

        let mut bundle = Bundle::new(name, Vec::new());
        bundle.description = input.description.trim().to_string();
        bundle.service_type = input.service_type.clone().filter(|s| !s.trim().is_empty());
        bundle.items = input.into_items();
        bundle
            .validate()
            .map_err(|e| ShopError::Validation(e.to_string()))?;

        self.storage.bundles.commit(bundle.clone())?;
        self.storage.log_create(
            EntityType::Bundle,
            bundle.id.to_string(),
            Some(bundle.name.clone()),
            &bundle,
        )?;

        info!(bundle = %bundle.name, items = bundle.items.len(), "bundle created");
        Ok(bundle)
    }

    /// Replace a bundle's name, description and items
    pub fn update(&self, id: BundleId, input: BundleInput) -> ShopResult<Bundle> {
        let mut bundle = self.load(id)?;
        let name = input.name.trim().to_string();
        if self.storage.bundles.name_exists(&name, Some(id))? {
            return Err(ShopError::Duplicate {
                entity_type: "Bundle",
                identifier: name,
            });
        }

        let before = bundle.clone();
        bundle.name = name;
        bundle.description = input.description.trim().to_string();
        bundle.service_type = input.service_type.clone().filter(|s| !s.trim().is_empty());
        bundle.items = input.into_items();
        bundle.updated_at = Utc::now();
        bundle
            .validate()
            .map_err(|e| ShopError::Validation(e.to_string()))?;

        self.save_update(&before, &bundle)?;
        Ok(bundle)
    }

    pub fn get(&self, id: BundleId) -> ShopResult<Option<Bundle>> {
        self.storage.bundles.get(id)
    }

    /// Find by name (case-insensitive) or id
    pub fn find(&self, identifier: &str) -> ShopResult<Option<Bundle>> {
        self.storage.bundles.find(identifier)
    }

    pub fn require(&self, identifier: &str) -> ShopResult<Bundle> {
        self.find(identifier)?
            .ok_or_else(|| ShopError::bundle_not_found(identifier))
    }

    pub fn list(&self, include_inactive: bool) -> ShopResult<Vec<Bundle>> {
        self.storage.bundles.list(include_inactive)
    }

    pub fn deactivate(&self, id: BundleId) -> ShopResult<Bundle> {
        self.set_active(id, false)
    }

    pub fn activate(&self, id: BundleId) -> ShopResult<Bundle> {
        self.set_active(id, true)
    }

    pub fn delete(&self, id: BundleId) -> ShopResult<Bundle> {
        let bundle = self.load(id)?;
        self.storage.bundles.commit_removal(id)?;
        self.storage.log_delete(
            EntityType::Bundle,
            bundle.id.to_string(),
            Some(bundle.name.clone()),
            &bundle,
        )?;
        info!(bundle = %bundle.name, "bundle deleted");
        Ok(bundle)
    }

    /// Expand a bundle into a new pending job on an estimate
    pub fn apply_to_estimate(
        &self,
        estimate_id: EstimateId,
        bundle_id: BundleId,
    ) -> ShopResult<(Estimate, JobId)> {
        let bundle = self.load(bundle_id)?;
        if !bundle.active {
            return Err(ShopError::Validation(format!(
                "Bundle '{}' is inactive",
                bundle.name
            )));
        }

        let editor = EstimateEditorService::new(self.storage, self.settings);
        let (estimate, job_id) = editor.attach_job(estimate_id, bundle.to_job())?;

        info!(
            bundle = %bundle.name,
            estimate = %estimate.number,
            "bundle applied to estimate"
        );
        Ok((estimate, job_id))
    }

    fn set_active(&self, id: BundleId, active: bool) -> ShopResult<Bundle> {
        let mut bundle = self.load(id)?;
        if bundle.active == active {
            return Ok(bundle);
        }
        let before = bundle.clone();
        bundle.active = active;
        bundle.updated_at = Utc::now();
        self.save_update(&before, &bundle)?;
        Ok(bundle)
    }

    fn load(&self, id: BundleId) -> ShopResult<Bundle> {
        self.storage
            .bundles
            .get(id)?
            .ok_or_else(|| ShopError::bundle_not_found(id.to_string()))
    }

    fn save_update(&self, before: &Bundle, after: &Bundle) -> ShopResult<()> {
        self.storage.bundles.commit(after.clone())?;
        self.storage.log_update(
            EntityType::Bundle,
            after.id.to_string(),
            Some(after.name.clone()),
            before,
            after,
            None,
        )
    }
}
