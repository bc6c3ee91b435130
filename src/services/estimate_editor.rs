//! Estimate editor
//!
//! Validates and saves an estimate together with its jobs and items as one
//! unit. Totals are never accepted from callers; they are recomputed from the
//! items on every save, and job and header statuses are re-derived from the
//! item decisions.

use std::collections::HashSet;

use chrono::Duration;
use serde::Deserialize;
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::error::{ShopError, ShopResult};
use crate::models::{
    ApprovalStatus, Estimate, EstimateId, EstimateItem, EstimateJob, EstimateStatus, ItemId,
    JobId, WorkorderId,
};
use crate::storage::Storage;

use super::{ensure_unlocked, today, LineInput};

/// An item as submitted; `id` keeps an existing item, `status` overrides its decision
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemInput {
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(flatten)]
    pub line: LineInput,
    #[serde(default)]
    pub status: Option<ApprovalStatus>,
}

impl From<LineInput> for ItemInput {
    fn from(line: LineInput) -> Self {
        Self {
            id: None,
            line,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobInput {
    #[serde(default)]
    pub id: Option<JobId>,
    pub title: String,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemInput>,
}

impl JobInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_item(mut self, line: LineInput) -> Self {
        self.items.push(line.into());
        self
    }

    fn validate(&self) -> ShopResult<()> {
        if self.title.trim().is_empty() {
            return Err(ShopError::Validation("Job title cannot be empty".into()));
        }
        let mut seen = HashSet::new();
        for item in &self.items {
            item.line.validate()?;
            if let Some(id) = item.id {
                if !seen.insert(id) {
                    return Err(ShopError::Validation(format!(
                        "Item {} appears more than once in job '{}'",
                        id,
                        self.title.trim()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Header fields and the full job list of an estimate
///
/// On update, a missing expiration date keeps the current one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EstimateInput {
    pub customer_id: u64,
    pub vehicle_id: u64,
    #[serde(default)]
    pub technician_id: Option<u64>,
    #[serde(default)]
    pub expiration_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub jobs: Vec<JobInput>,
}

impl EstimateInput {
    fn validate(&self) -> ShopResult<()> {
        if self.customer_id == 0 {
            return Err(ShopError::Validation("A customer is required".into()));
        }
        if self.vehicle_id == 0 {
            return Err(ShopError::Validation("A vehicle is required".into()));
        }
        let mut seen = HashSet::new();
        for job in &self.jobs {
            job.validate()?;
            if let Some(id) = job.id {
                if !seen.insert(id) {
                    return Err(ShopError::Validation(format!(
                        "Job {} appears more than once",
                        id
                    )));
                }
            }
        }
        Ok(())
    }
}

fn build_item(input: ItemInput, existing: Option<&EstimateJob>) -> EstimateItem {
    let line = input.line;
    let mut item = EstimateItem::new(
        line.item_type,
        line.description.trim(),
        line.quantity,
        line.unit_price,
        line.taxable,
    );
    let previous = input
        .id
        .and_then(|id| existing.and_then(|job| job.items.iter().find(|i| i.id == id)));
    if let Some(previous) = previous {
        item.id = previous.id;
        item.status = previous.status;
    }
    if let Some(status) = input.status {
        item.status = status;
    }
    item
}

fn build_job(input: JobInput, existing: Option<&EstimateJob>) -> EstimateJob {
    let mut job = match existing {
        Some(previous) => previous.clone(),
        None => EstimateJob::new(String::new()),
    };
    job.title = input.title.trim().to_string();
    job.service_type = input.service_type.filter(|s| !s.trim().is_empty());
    job.items = input
        .items
        .into_iter()
        .map(|item| build_item(item, existing))
        .collect();
    job
}

/// Service for editing estimate aggregates
pub struct EstimateEditorService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> EstimateEditorService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    /// Create a new estimate from a header and its jobs
    pub fn create(&self, input: EstimateInput) -> ShopResult<Estimate> {
        self.create_with_parent(input, None)
    }

    /// Create an estimate for work discovered on an open workorder
    pub fn create_for_workorder(
        &self,
        parent: WorkorderId,
        input: EstimateInput,
    ) -> ShopResult<Estimate> {
        self.create_with_parent(input, Some(parent))
    }

    fn create_with_parent(
        &self,
        input: EstimateInput,
        parent: Option<WorkorderId>,
    ) -> ShopResult<Estimate> {
        input.validate()?;

        let today = today();
        if input.expiration_date.map_or(false, |d| d < today) {
            return Err(ShopError::Validation(
                "Expiration date cannot be in the past".into(),
            ));
        }

        let number = self
            .storage
            .estimates
            .next_number(&self.settings.prefixes.estimate)?;

        let mut estimate = Estimate::new(number, input.customer_id, input.vehicle_id);
        estimate.technician_id = input.technician_id;
        estimate.tax_rate_bps = self.settings.tax_rate_bps;
        estimate.parent_workorder_id = parent;
        estimate.notes = input.notes.trim().to_string();
        estimate.expiration_date = Some(input.expiration_date.unwrap_or_else(|| {
            today + Duration::days(i64::from(self.settings.estimate_validity_days))
        }));
        estimate.jobs = input
            .jobs
            .into_iter()
            .map(|job| build_job(job, None))
            .collect();
        estimate.normalize();

        self.storage.estimates.commit(estimate.clone())?;
        self.storage.log_create(
            EntityType::Estimate,
            estimate.id.to_string(),
            Some(estimate.number.clone()),
            &estimate,
        )?;

        info!(
            estimate = %estimate.number,
            jobs = estimate.jobs.len(),
            total = %estimate.grand_total,
            "estimate created"
        );
        Ok(estimate)
    }

    /// Replace the header and job list of an estimate
    ///
    /// Jobs and items that carry an existing id keep it along with their
    /// decision; anything omitted is removed.
    pub fn update(&self, id: EstimateId, input: EstimateInput) -> ShopResult<Estimate> {
        input.validate()?;

        self.edit(id, |estimate| {
            estimate.customer_id = input.customer_id;
            estimate.vehicle_id = input.vehicle_id;
            estimate.technician_id = input.technician_id;
            estimate.notes = input.notes.trim().to_string();

            if let Some(date) = input.expiration_date {
                estimate.expiration_date = Some(date);
                if estimate.status == EstimateStatus::Expired && date >= today() {
                    estimate.status = EstimateStatus::Pending;
                }
            }

            let previous_jobs = std::mem::take(&mut estimate.jobs);
            estimate.jobs = input
                .jobs
                .into_iter()
                .map(|job| {
                    let existing = job
                        .id
                        .and_then(|id| previous_jobs.iter().find(|j| j.id == id));
                    build_job(job, existing)
                })
                .collect();
            Ok(())
        })
    }

    /// Append a job built from caller input
    pub fn add_job(&self, id: EstimateId, input: JobInput) -> ShopResult<(Estimate, JobId)> {
        input.validate()?;
        self.attach_job(id, build_job(input, None))
    }

    /// Append an already-built job, such as one expanded from a bundle
    pub fn attach_job(&self, id: EstimateId, job: EstimateJob) -> ShopResult<(Estimate, JobId)> {
        let job_id = job.id;
        let estimate = self.edit(id, move |estimate| {
            estimate.jobs.push(job);
            Ok(())
        })?;
        Ok((estimate, job_id))
    }

    pub fn remove_job(&self, id: EstimateId, job_id: JobId) -> ShopResult<Estimate> {
        self.edit(id, |estimate| {
            let before = estimate.jobs.len();
            estimate.jobs.retain(|j| j.id != job_id);
            if estimate.jobs.len() == before {
                return Err(ShopError::job_not_found(job_id.to_string()));
            }
            Ok(())
        })
    }

    pub fn add_item(
        &self,
        id: EstimateId,
        job_id: JobId,
        line: LineInput,
    ) -> ShopResult<(Estimate, ItemId)> {
        line.validate()?;
        let item = build_item(line.into(), None);
        let item_id = item.id;
        let estimate = self.edit(id, |estimate| {
            let job = estimate
                .job_mut(job_id)
                .ok_or_else(|| ShopError::job_not_found(job_id.to_string()))?;
            job.items.push(item);
            Ok(())
        })?;
        Ok((estimate, item_id))
    }

    pub fn remove_item(
        &self,
        id: EstimateId,
        job_id: JobId,
        item_id: ItemId,
    ) -> ShopResult<Estimate> {
        self.edit(id, |estimate| {
            let job = estimate
                .job_mut(job_id)
                .ok_or_else(|| ShopError::job_not_found(job_id.to_string()))?;
            let before = job.items.len();
            job.items.retain(|i| i.id != item_id);
            if job.items.len() == before {
                return Err(ShopError::item_not_found(item_id.to_string()));
            }
            Ok(())
        })
    }

    /// Record a decision on a single item
    pub fn set_item_status(
        &self,
        id: EstimateId,
        job_id: JobId,
        item_id: ItemId,
        status: ApprovalStatus,
    ) -> ShopResult<Estimate> {
        self.edit(id, |estimate| {
            let job = estimate
                .job_mut(job_id)
                .ok_or_else(|| ShopError::job_not_found(job_id.to_string()))?;
            let item = job
                .items
                .iter_mut()
                .find(|i| i.id == item_id)
                .ok_or_else(|| ShopError::item_not_found(item_id.to_string()))?;
            item.status = status;
            Ok(())
        })
    }

    /// Record a staff decision on a whole job
    pub fn set_job_status(
        &self,
        id: EstimateId,
        job_id: JobId,
        status: ApprovalStatus,
        reason: Option<String>,
    ) -> ShopResult<Estimate> {
        self.edit(id, |estimate| {
            let job = estimate
                .job_mut(job_id)
                .ok_or_else(|| ShopError::job_not_found(job_id.to_string()))?;
            job.decide(status, reason);
            Ok(())
        })
    }

    /// Load, check the lock, apply `change`, normalize and persist
    fn edit<F>(&self, id: EstimateId, change: F) -> ShopResult<Estimate>
    where
        F: FnOnce(&mut Estimate) -> ShopResult<()>,
    {
        let mut estimate = self
            .storage
            .estimates
            .get(id)?
            .ok_or_else(|| ShopError::estimate_not_found(id.to_string()))?;

        ensure_unlocked(&estimate)?;

        let before = estimate.clone();
        change(&mut estimate)?;

        if let Some(previous) = estimate.normalize() {
            info!(
                estimate = %estimate.number,
                from = %previous,
                to = %estimate.status,
                "estimate status re-derived"
            );
        }
        debug!(
            estimate = %estimate.number,
            subtotal = %estimate.subtotal,
            tax = %estimate.tax,
            total = %estimate.grand_total,
            "estimate totals recomputed"
        );

        self.storage.estimates.commit(estimate.clone())?;
        self.storage.log_update(
            EntityType::Estimate,
            estimate.id.to_string(),
            Some(estimate.number.clone()),
            &before,
            &estimate,
            None,
        )?;

        Ok(estimate)
    }
}
