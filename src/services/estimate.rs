//! Estimate lifecycle service
//!
//! Header-level transitions: send, approve, reject, expire and conversion
//! to an invoice. Staff approval and rejection cascade to every job and
//! item so the derived status agrees with the decision.

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::error::{ShopError, ShopResult};
use crate::models::{
    ApprovalStatus, Estimate, EstimateComment, EstimateId, EstimateStatus, Invoice, InvoiceLine,
    InvoiceSection, InvoiceSource,
};
use crate::storage::{EstimateFilter, Storage};

use super::ensure_unlocked;
use super::invoice::InvoiceService;

pub struct EstimateService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> EstimateService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    pub fn get(&self, id: EstimateId) -> ShopResult<Option<Estimate>> {
        self.storage.estimates.get(id)
    }

    /// Find by number, UUID or short id
    pub fn find(&self, identifier: &str) -> ShopResult<Option<Estimate>> {
        self.storage.estimates.find(identifier)
    }

    pub fn require(&self, identifier: &str) -> ShopResult<Estimate> {
        self.find(identifier)?
            .ok_or_else(|| ShopError::estimate_not_found(identifier))
    }

    pub fn list(&self, filter: &EstimateFilter) -> ShopResult<Vec<Estimate>> {
        self.storage.estimates.list(filter)
    }

    /// pending → sent
    pub fn send(&self, id: EstimateId) -> ShopResult<Estimate> {
        self.transition(id, EstimateStatus::Sent)
    }

    /// Approve every job and item; the estimate becomes approved
    pub fn approve(&self, id: EstimateId) -> ShopResult<Estimate> {
        self.decide(id, ApprovalStatus::Approved, None)
    }

    /// Reject every job and item, keeping the reason on the header
    pub fn reject(&self, id: EstimateId, reason: Option<String>) -> ShopResult<Estimate> {
        self.decide(id, ApprovalStatus::Rejected, reason)
    }

    /// pending/sent → expired
    pub fn expire(&self, id: EstimateId) -> ShopResult<Estimate> {
        self.transition(id, EstimateStatus::Expired)
    }

    /// Expire every estimate still awaiting a decision whose expiration date
    /// is before `today`; returns the estimates touched
    pub fn expire_overdue(&self, today: NaiveDate) -> ShopResult<Vec<Estimate>> {
        let overdue = self.storage.estimates.list(&EstimateFilter::default())?;
        let mut expired = Vec::new();
        for estimate in overdue
            .into_iter()
            .filter(|e| {
                e.status.awaiting_decision() && !e.is_locked() && e.is_past_expiration(today)
            })
        {
            expired.push(self.expire(estimate.id)?);
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "expired overdue estimates");
        }
        Ok(expired)
    }

    /// Turn an approved estimate that never went to the floor into an invoice
    ///
    /// The invoice carries one section per approved job with only the
    /// approved items. The estimate becomes converted and read-only.
    pub fn convert_to_invoice(&self, id: EstimateId) -> ShopResult<(Estimate, Invoice)> {
        let mut estimate = self.load(id)?;

        if estimate.status != EstimateStatus::Approved {
            return Err(ShopError::transition(
                "Estimate",
                estimate.status,
                EstimateStatus::Converted,
            ));
        }
        if let Some(workorder_id) = estimate.workorder_id {
            return Err(ShopError::Validation(format!(
                "Estimate {} already has workorder {}; invoice the workorder instead",
                estimate.number, workorder_id
            )));
        }
        if estimate.parent_workorder_id.is_some() {
            return Err(ShopError::Validation(format!(
                "Estimate {} covers additional work on a workorder; merge it instead",
                estimate.number
            )));
        }

        let sections = estimate
            .approved_work()
            .into_iter()
            .map(|job| InvoiceSection {
                title: job.title.clone(),
                lines: job.items.iter().map(InvoiceLine::from).collect(),
            })
            .collect();

        let invoices = InvoiceService::new(self.storage, self.settings);
        let invoice = invoices.issue(
            InvoiceSource::Estimate(estimate.id),
            estimate.customer_id,
            estimate.vehicle_id,
            estimate.tax_rate_bps,
            sections,
        )?;

        let before = estimate.clone();
        estimate
            .transition(EstimateStatus::Converted)
            .map_err(|(from, to)| ShopError::transition("Estimate", from, to))?;
        estimate.invoice_id = Some(invoice.id);

        if let Err(e) = self.storage.estimates.commit(estimate.clone()) {
            invoices.withdraw(invoice.id)?;
            return Err(e);
        }
        self.storage.log_update(
            EntityType::Estimate,
            estimate.id.to_string(),
            Some(estimate.number.clone()),
            &before,
            &estimate,
            None,
        )?;

        info!(
            estimate = %estimate.number,
            invoice = %invoice.number,
            "estimate converted to invoice"
        );
        Ok((estimate, invoice))
    }

    /// Add a staff note to the estimate's comment thread
    pub fn add_comment(&self, id: EstimateId, author: &str, body: &str) -> ShopResult<Estimate> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ShopError::Validation("Comment cannot be empty".into()));
        }
        let mut estimate = self.load(id)?;
        let before = estimate.clone();
        estimate.comments.push(EstimateComment {
            author: author.trim().to_string(),
            body: body.to_string(),
            from_customer: false,
            created_at: Utc::now(),
        });
        estimate.updated_at = Utc::now();
        self.save_update(&before, &estimate)?;
        Ok(estimate)
    }

    /// Delete a pending estimate that nothing downstream refers to
    ///
    /// Its public links are revoked.
    pub fn delete(&self, id: EstimateId) -> ShopResult<Estimate> {
        let estimate = self.load(id)?;

        ensure_unlocked(&estimate)?;
        if estimate.status != EstimateStatus::Pending {
            return Err(ShopError::Validation(format!(
                "Only pending estimates can be deleted; {} is {}",
                estimate.number, estimate.status
            )));
        }

        self.storage.estimates.commit_removal(id)?;
        self.storage.log_delete(
            EntityType::Estimate,
            estimate.id.to_string(),
            Some(estimate.number.clone()),
            &estimate,
        )?;

        let now = Utc::now();
        for mut link in self.storage.public_links.active_for_estimate(id, now)? {
            let before = link.clone();
            link.revoke();
            self.storage.public_links.commit(link.clone())?;
            self.storage.log_update(
                EntityType::PublicLink,
                link.id.to_string(),
                Some(link.short_code.clone()),
                &before,
                &link,
                None,
            )?;
        }

        info!(estimate = %estimate.number, "estimate deleted");
        Ok(estimate)
    }

    fn decide(
        &self,
        id: EstimateId,
        decision: ApprovalStatus,
        reason: Option<String>,
    ) -> ShopResult<Estimate> {
        let target = match decision {
            ApprovalStatus::Rejected => EstimateStatus::Rejected,
            _ => EstimateStatus::Approved,
        };
        let reason = reason.filter(|r| !r.trim().is_empty());

        let mut estimate = self.load(id)?;
        ensure_unlocked(&estimate)?;
        if !estimate.status.can_transition_to(target) {
            return Err(ShopError::transition("Estimate", estimate.status, target));
        }
        if estimate.jobs.is_empty() {
            return Err(ShopError::Validation(format!(
                "Estimate {} has no jobs to decide on",
                estimate.number
            )));
        }

        let before = estimate.clone();
        for job in &mut estimate.jobs {
            job.decide(decision, None);
        }
        estimate.rejection_reason = reason;
        estimate.normalize();

        self.save_update(&before, &estimate)?;
        info!(estimate = %estimate.number, status = %estimate.status, "estimate decided by staff");
        Ok(estimate)
    }

    fn transition(&self, id: EstimateId, to: EstimateStatus) -> ShopResult<Estimate> {
        let mut estimate = self.load(id)?;
        ensure_unlocked(&estimate)?;

        let before = estimate.clone();
        let from = estimate.transition(to).map_err(|(from, to)| {
            warn!(estimate = %before.number, %from, %to, "refused estimate transition");
            ShopError::transition("Estimate", from, to)
        })?;

        self.save_update(&before, &estimate)?;
        info!(estimate = %estimate.number, %from, %to, "estimate status changed");
        Ok(estimate)
    }

    fn load(&self, id: EstimateId) -> ShopResult<Estimate> {
        self.storage
            .estimates
            .get(id)?
            .ok_or_else(|| ShopError::estimate_not_found(id.to_string()))
    }

    fn save_update(&self, before: &Estimate, after: &Estimate) -> ShopResult<()> {
        self.storage.estimates.commit(after.clone())?;
        self.storage.log_update(
            EntityType::Estimate,
            after.id.to_string(),
            Some(after.number.clone()),
            before,
            after,
            None,
        )
    }
}
