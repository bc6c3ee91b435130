//! Estimate aggregate: header, jobs and line items
//!
//! An estimate owns its jobs and their items and is persisted as one unit.
//! Header totals and status are derived from the items; nothing outside this
//! module writes them directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{EstimateId, InvoiceId, ItemId, JobId, WorkorderId};
use super::line_item::{ApprovalStatus, ItemType, PricedLine, Totals};
use super::money::{Money, Quantity};

/// Lifecycle status of an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EstimateStatus {
    /// Being drafted or awaiting customer review
    #[default]
    Pending,
    /// Presented to the customer
    Sent,
    Approved,
    Rejected,
    /// Passed its expiration date without a decision
    Expired,
    /// Turned into an invoice or merged into a workorder
    Converted,
}

impl EstimateStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "expired" => Some(Self::Expired),
            "converted" => Some(Self::Converted),
            _ => None,
        }
    }

    /// Explicit transitions allowed by staff or customer actions
    pub fn can_transition_to(&self, to: EstimateStatus) -> bool {
        use EstimateStatus::*;
        matches!(
            (self, to),
            (Pending, Sent)
                | (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Expired)
                | (Sent, Approved)
                | (Sent, Rejected)
                | (Sent, Expired)
                | (Approved, Converted)
        )
    }

    /// Whether the customer can still act on the estimate
    pub fn awaiting_decision(&self) -> bool {
        matches!(self, Self::Pending | Self::Sent)
    }
}

impl fmt::Display for EstimateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Converted => "converted",
        };
        write!(f, "{}", s)
    }
}

/// A priced line on an estimate job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateItem {
    pub id: ItemId,
    pub item_type: ItemType,
    pub description: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    #[serde(default)]
    pub taxable: bool,
    #[serde(default)]
    pub status: ApprovalStatus,
    /// quantity x unit_price, kept for display and export
    #[serde(default)]
    pub line_total: Money,
}

impl EstimateItem {
    pub fn new(
        item_type: ItemType,
        description: impl Into<String>,
        quantity: Quantity,
        unit_price: Money,
        taxable: bool,
    ) -> Self {
        let mut item = Self {
            id: ItemId::new(),
            item_type,
            description: description.into(),
            quantity,
            unit_price,
            taxable,
            status: ApprovalStatus::Pending,
            line_total: Money::zero(),
        };
        item.line_total = PricedLine::line_total(&item);
        item
    }
}

impl PricedLine for EstimateItem {
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
    fn counts(&self) -> bool {
        self.status != ApprovalStatus::Rejected
    }
}

/// A unit of work on an estimate (e.g. "Front brake service")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateJob {
    pub id: JobId,
    pub title: String,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub customer_status: ApprovalStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub items: Vec<EstimateItem>,
    /// Net of fees and discounts, before tax
    #[serde(default)]
    pub subtotal: Money,
    #[serde(default)]
    pub tax: Money,
    #[serde(default)]
    pub total: Money,
}

impl EstimateJob {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            title: title.into(),
            service_type: None,
            customer_status: ApprovalStatus::Pending,
            rejection_reason: None,
            items: Vec::new(),
            subtotal: Money::zero(),
            tax: Money::zero(),
            total: Money::zero(),
        }
    }

    /// Set the customer decision on this job and every item in it
    pub fn decide(&mut self, status: ApprovalStatus, reason: Option<String>) {
        self.customer_status = status;
        self.rejection_reason = match status {
            ApprovalStatus::Rejected => reason,
            _ => None,
        };
        for item in &mut self.items {
            item.status = status;
        }
    }

    /// Recompute line and job totals, returning the job's contribution to the header
    fn recompute(&mut self, tax_rate_bps: u32) -> Totals {
        for item in &mut self.items {
            item.line_total = PricedLine::line_total(&*item);
        }
        let totals = Totals::from_lines(&self.items, tax_rate_bps);
        self.subtotal = totals.net();
        self.tax = totals.tax;
        self.total = totals.grand_total;
        totals
    }

    /// Derive the job status from its items once they have all been decided
    fn sync_status(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let derived = ApprovalStatus::converge(self.items.iter().map(|i| i.status))
            .unwrap_or(ApprovalStatus::Pending);
        if derived != ApprovalStatus::Rejected {
            self.rejection_reason = None;
        }
        self.customer_status = derived;
    }
}

/// Customer signature captured through a public link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateSignature {
    pub signer_name: String,
    /// Base64-encoded signature image
    pub signature_data: String,
    pub signed_at: DateTime<Utc>,
}

/// Comment left on an estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateComment {
    pub author: String,
    pub body: String,
    #[serde(default)]
    pub from_customer: bool,
    pub created_at: DateTime<Utc>,
}

/// An estimate header with its jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub id: EstimateId,

    /// Human-facing number, e.g. EST-000042
    pub number: String,

    pub customer_id: u64,
    pub vehicle_id: u64,
    #[serde(default)]
    pub technician_id: Option<u64>,

    #[serde(default)]
    pub status: EstimateStatus,

    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,

    /// Tax rate in basis points, fixed when the estimate is created
    #[serde(default)]
    pub tax_rate_bps: u32,

    #[serde(default)]
    pub jobs: Vec<EstimateJob>,

    // Derived totals
    #[serde(default)]
    pub subtotal: Money,
    #[serde(default)]
    pub fees: Money,
    #[serde(default)]
    pub discounts: Money,
    #[serde(default)]
    pub tax: Money,
    #[serde(default)]
    pub grand_total: Money,

    #[serde(default)]
    pub notes: String,

    /// Set when this estimate covers work discovered on a workorder
    #[serde(default)]
    pub parent_workorder_id: Option<WorkorderId>,
    #[serde(default)]
    pub workorder_id: Option<WorkorderId>,
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,

    #[serde(default)]
    pub signature: Option<EstimateSignature>,
    #[serde(default)]
    pub comments: Vec<EstimateComment>,

    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Estimate {
    pub fn new(number: impl Into<String>, customer_id: u64, vehicle_id: u64) -> Self {
        let now = Utc::now();
        Self {
            id: EstimateId::new(),
            number: number.into(),
            customer_id,
            vehicle_id,
            technician_id: None,
            status: EstimateStatus::Pending,
            expiration_date: None,
            tax_rate_bps: 0,
            jobs: Vec::new(),
            subtotal: Money::zero(),
            fees: Money::zero(),
            discounts: Money::zero(),
            tax: Money::zero(),
            grand_total: Money::zero(),
            notes: String::new(),
            parent_workorder_id: None,
            workorder_id: None,
            invoice_id: None,
            signature: None,
            comments: Vec::new(),
            rejection_reason: None,
            sent_at: None,
            approved_at: None,
            rejected_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn job(&self, id: JobId) -> Option<&EstimateJob> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn job_mut(&mut self, id: JobId) -> Option<&mut EstimateJob> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    /// Resolve a job by full UUID or displayed short id (`job-1a2b3c4d`)
    pub fn find_job_id(&self, s: &str) -> Option<JobId> {
        let s = s.trim();
        if let Ok(id) = s.parse::<JobId>() {
            return self.job(id).map(|j| j.id);
        }
        let mut matches = self.jobs.iter().filter(|j| j.id.matches_short(s));
        match (matches.next(), matches.next()) {
            (Some(job), None) => Some(job.id),
            _ => None,
        }
    }

    /// Resolve an item anywhere on the estimate, returning its job as well
    pub fn find_item_id(&self, s: &str) -> Option<(JobId, ItemId)> {
        let s = s.trim();
        let exact = s.parse::<ItemId>().ok();
        let mut matches = self.jobs.iter().flat_map(|j| {
            j.items
                .iter()
                .filter(move |i| exact.map_or_else(|| i.id.matches_short(s), |id| i.id == id))
                .map(move |i| (j.id, i.id))
        });
        match (matches.next(), matches.next()) {
            (Some(found), None) => Some(found),
            _ => None,
        }
    }

    /// Whether the aggregate may still be edited
    pub fn is_locked(&self) -> bool {
        self.status == EstimateStatus::Converted
            || self.workorder_id.is_some()
            || self.invoice_id.is_some()
    }

    pub fn is_past_expiration(&self, today: NaiveDate) -> bool {
        self.expiration_date.map_or(false, |d| d < today)
    }

    pub fn has_pending_jobs(&self) -> bool {
        self.jobs
            .iter()
            .any(|j| j.customer_status == ApprovalStatus::Pending)
    }

    /// Jobs the customer approved, with only their approved items
    pub fn approved_work(&self) -> Vec<EstimateJob> {
        self.jobs
            .iter()
            .filter(|j| j.customer_status == ApprovalStatus::Approved)
            .map(|j| {
                let mut job = j.clone();
                job.items.retain(|i| i.status == ApprovalStatus::Approved);
                job
            })
            .collect()
    }

    /// Recompute every line, job and header total from the items
    pub fn recompute_totals(&mut self) {
        let rate = self.tax_rate_bps;
        let totals: Totals = self
            .jobs
            .iter_mut()
            .map(|job| {
                let totals = job.recompute(rate);
                if job.customer_status == ApprovalStatus::Rejected {
                    Totals::default()
                } else {
                    totals
                }
            })
            .sum();

        self.subtotal = totals.subtotal;
        self.fees = totals.fees;
        self.discounts = totals.discounts;
        self.tax = totals.tax;
        self.grand_total = totals.grand_total;
    }

    /// Derive job and header status from item decisions
    ///
    /// Returns the previous status when the header status changed.
    pub fn sync_status(&mut self) -> Option<EstimateStatus> {
        for job in &mut self.jobs {
            job.sync_status();
        }

        let previous = self.status;
        if matches!(previous, EstimateStatus::Converted | EstimateStatus::Expired) {
            return None;
        }

        let derived = match ApprovalStatus::converge(self.jobs.iter().map(|j| j.customer_status)) {
            Some(ApprovalStatus::Approved) => EstimateStatus::Approved,
            Some(ApprovalStatus::Rejected) => EstimateStatus::Rejected,
            _ if self.sent_at.is_some() => EstimateStatus::Sent,
            _ => EstimateStatus::Pending,
        };

        if derived == previous {
            return None;
        }

        let now = Utc::now();
        match derived {
            EstimateStatus::Approved => {
                self.approved_at = Some(now);
                self.rejection_reason = None;
            }
            EstimateStatus::Rejected => self.rejected_at = Some(now),
            _ => {}
        }
        self.status = derived;
        Some(previous)
    }

    /// Recompute totals and status together and bump the modification time
    pub fn normalize(&mut self) -> Option<EstimateStatus> {
        let changed = self.sync_status();
        self.recompute_totals();
        self.updated_at = Utc::now();
        changed
    }

    /// Apply an explicit status transition
    pub fn transition(
        &mut self,
        to: EstimateStatus,
    ) -> Result<EstimateStatus, (EstimateStatus, EstimateStatus)> {
        let from = self.status;
        if !from.can_transition_to(to) {
            return Err((from, to));
        }

        let now = Utc::now();
        match to {
            EstimateStatus::Sent => self.sent_at = Some(now),
            EstimateStatus::Approved => self.approved_at = Some(now),
            EstimateStatus::Rejected => self.rejected_at = Some(now),
            _ => {}
        }
        self.status = to;
        self.updated_at = now;
        Ok(from)
    }

    /// Search text used by free-text filtering
    pub fn matches_text(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.number.to_lowercase().contains(&q)
            || self.notes.to_lowercase().contains(&q)
            || self.jobs.iter().any(|j| j.title.to_lowercase().contains(&q))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brake_job() -> EstimateJob {
        let mut job = EstimateJob::new("Front brakes");
        job.items.push(EstimateItem::new(
            ItemType::Labor,
            "Replace pads",
            Quantity::from_hundredths(150),
            Money::from_cents(10000),
            false,
        ));
        job.items.push(EstimateItem::new(
            ItemType::Part,
            "Pad set",
            Quantity::units(1),
            Money::from_cents(6000),
            true,
        ));
        job
    }

    fn estimate_with_jobs(n: usize) -> Estimate {
        let mut estimate = Estimate::new("EST-000001", 10, 20);
        estimate.tax_rate_bps = 1000;
        for _ in 0..n {
            estimate.jobs.push(brake_job());
        }
        estimate.normalize();
        estimate
    }

    #[test]
    fn test_totals_from_items() {
        let estimate = estimate_with_jobs(2);
        assert_eq!(estimate.subtotal.cents(), 2 * (15000 + 6000));
        assert_eq!(estimate.tax.cents(), 2 * 600);
        assert_eq!(estimate.grand_total.cents(), 2 * 21600);
        assert_eq!(estimate.jobs[0].total.cents(), 21600);
        assert_eq!(estimate.jobs[0].items[0].line_total.cents(), 15000);
    }

    #[test]
    fn test_rejected_job_excluded_from_header() {
        let mut estimate = estimate_with_jobs(2);
        estimate.jobs[1].decide(ApprovalStatus::Rejected, Some("later".into()));
        estimate.normalize();
        assert_eq!(estimate.grand_total.cents(), 21600);
    }

    #[test]
    fn test_status_converges_to_approved() {
        let mut estimate = estimate_with_jobs(2);
        estimate.jobs[0].decide(ApprovalStatus::Approved, None);
        assert_eq!(estimate.normalize(), None);
        assert_eq!(estimate.status, EstimateStatus::Pending);

        estimate.jobs[1].decide(ApprovalStatus::Rejected, None);
        assert_eq!(estimate.normalize(), Some(EstimateStatus::Pending));
        assert_eq!(estimate.status, EstimateStatus::Approved);
        assert!(estimate.approved_at.is_some());
    }

    #[test]
    fn test_status_all_rejected() {
        let mut estimate = estimate_with_jobs(1);
        estimate.transition(EstimateStatus::Sent).unwrap();
        estimate.jobs[0].decide(ApprovalStatus::Rejected, None);
        estimate.normalize();
        assert_eq!(estimate.status, EstimateStatus::Rejected);
    }

    #[test]
    fn test_new_pending_item_reopens_sent_estimate() {
        let mut estimate = estimate_with_jobs(1);
        estimate.transition(EstimateStatus::Sent).unwrap();
        estimate.jobs[0].decide(ApprovalStatus::Approved, None);
        estimate.normalize();
        assert_eq!(estimate.status, EstimateStatus::Approved);

        estimate.jobs[0].items.push(EstimateItem::new(
            ItemType::Fee,
            "Shop supplies",
            Quantity::units(1),
            Money::from_cents(500),
            false,
        ));
        estimate.normalize();
        assert_eq!(estimate.jobs[0].customer_status, ApprovalStatus::Pending);
        assert_eq!(estimate.status, EstimateStatus::Sent);
    }

    #[test]
    fn test_item_level_convergence() {
        let mut estimate = estimate_with_jobs(1);
        estimate.jobs[0].items[0].status = ApprovalStatus::Approved;
        estimate.jobs[0].items[1].status = ApprovalStatus::Rejected;
        estimate.normalize();
        assert_eq!(estimate.jobs[0].customer_status, ApprovalStatus::Approved);
        assert_eq!(estimate.status, EstimateStatus::Approved);
        // rejected part no longer counts
        assert_eq!(estimate.grand_total.cents(), 15000);
    }

    #[test]
    fn test_transition_rules() {
        let mut estimate = estimate_with_jobs(1);
        assert!(estimate.transition(EstimateStatus::Converted).is_err());
        assert_eq!(estimate.transition(EstimateStatus::Sent), Ok(EstimateStatus::Pending));
        assert!(estimate.sent_at.is_some());
        assert!(estimate.transition(EstimateStatus::Pending).is_err());
        estimate.transition(EstimateStatus::Expired).unwrap();
        assert!(!estimate.status.awaiting_decision());
    }

    #[test]
    fn test_approved_work_filters_items() {
        let mut estimate = estimate_with_jobs(2);
        estimate.jobs[0].items[0].status = ApprovalStatus::Approved;
        estimate.jobs[0].items[1].status = ApprovalStatus::Rejected;
        estimate.jobs[1].decide(ApprovalStatus::Rejected, None);
        estimate.normalize();

        let work = estimate.approved_work();
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].items.len(), 1);
        assert_eq!(work[0].items[0].description, "Replace pads");
    }
}
