//! Workorder model
//!
//! A workorder is derived from an approved estimate. It mirrors the
//! estimate's job/item structure but is edited independently while the
//! work is carried out, and keeps an audit trail of status changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::estimate::{EstimateItem, EstimateJob};
use super::ids::{EstimateId, InvoiceId, ItemId, JobId, WorkorderId};
use super::line_item::{ItemType, PricedLine, Totals};
use super::money::{Money, Quantity};

/// Status of a workorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkorderStatus {
    #[default]
    Pending,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

impl WorkorderStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" | "started" => Some(Self::InProgress),
            "on_hold" | "hold" => Some(Self::OnHold),
            "completed" | "complete" | "done" => Some(Self::Completed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, to: WorkorderStatus) -> bool {
        use WorkorderStatus::*;
        matches!(
            (self, to),
            (Pending, InProgress)
                | (Pending, OnHold)
                | (Pending, Cancelled)
                | (InProgress, OnHold)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
                | (OnHold, InProgress)
                | (OnHold, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for WorkorderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkorderItem {
    pub id: ItemId,
    /// Estimate item this line was copied from, if any
    #[serde(default)]
    pub source_item_id: Option<ItemId>,
    pub item_type: ItemType,
    pub description: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    #[serde(default)]
    pub taxable: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub line_total: Money,
}

impl WorkorderItem {
    pub fn new(
        item_type: ItemType,
        description: impl Into<String>,
        quantity: Quantity,
        unit_price: Money,
        taxable: bool,
    ) -> Self {
        let mut item = Self {
            id: ItemId::new(),
            source_item_id: None,
            item_type,
            description: description.into(),
            quantity,
            unit_price,
            taxable,
            completed: false,
            line_total: Money::zero(),
        };
        item.line_total = PricedLine::line_total(&item);
        item
    }
}

impl From<&EstimateItem> for WorkorderItem {
    fn from(item: &EstimateItem) -> Self {
        let mut copy = Self::new(
            item.item_type,
            item.description.clone(),
            item.quantity,
            item.unit_price,
            item.taxable,
        );
        copy.source_item_id = Some(item.id);
        copy
    }
}

impl PricedLine for WorkorderItem {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkorderJob {
    pub id: JobId,
    /// Estimate (original or sub-estimate) the job came from
    pub source_estimate_id: EstimateId,
    #[serde(default)]
    pub source_job_id: Option<JobId>,
    pub title: String,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub items: Vec<WorkorderItem>,
    #[serde(default)]
    pub subtotal: Money,
    #[serde(default)]
    pub tax: Money,
    #[serde(default)]
    pub total: Money,
}

impl WorkorderJob {
    /// Copy an approved estimate job (its items are copied as given)
    pub fn from_estimate_job(estimate_id: EstimateId, job: &EstimateJob) -> Self {
        Self {
            id: JobId::new(),
            source_estimate_id: estimate_id,
            source_job_id: Some(job.id),
            title: job.title.clone(),
            service_type: job.service_type.clone(),
            items: job.items.iter().map(WorkorderItem::from).collect(),
            subtotal: Money::zero(),
            tax: Money::zero(),
            total: Money::zero(),
        }
    }
}

/// One entry in the workorder status audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkorderStatusHistory {
    #[serde(default)]
    pub from: Option<WorkorderStatus>,
    pub to: WorkorderStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workorder {
    pub id: WorkorderId,
    /// Human-facing number, e.g. WO-000012
    pub number: String,
    pub estimate_id: EstimateId,
    pub customer_id: u64,
    pub vehicle_id: u64,
    #[serde(default)]
    pub technician_id: Option<u64>,
    #[serde(default)]
    pub status: WorkorderStatus,
    #[serde(default)]
    pub tax_rate_bps: u32,
    #[serde(default)]
    pub jobs: Vec<WorkorderJob>,

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
    pub history: Vec<WorkorderStatusHistory>,
    /// Estimates created for work discovered during the job
    #[serde(default)]
    pub sub_estimate_ids: Vec<EstimateId>,
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workorder {
    pub fn new(
        number: impl Into<String>,
        estimate_id: EstimateId,
        customer_id: u64,
        vehicle_id: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: WorkorderId::new(),
            number: number.into(),
            estimate_id,
            customer_id,
            vehicle_id,
            technician_id: None,
            status: WorkorderStatus::Pending,
            tax_rate_bps: 0,
            jobs: Vec::new(),
            subtotal: Money::zero(),
            fees: Money::zero(),
            discounts: Money::zero(),
            tax: Money::zero(),
            grand_total: Money::zero(),
            history: vec![WorkorderStatusHistory {
                from: None,
                to: WorkorderStatus::Pending,
                note: None,
                actor: None,
                changed_at: now,
            }],
            sub_estimate_ids: Vec::new(),
            invoice_id: None,
            notes: String::new(),
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Completed, cancelled or invoiced workorders cannot be edited
    pub fn is_locked(&self) -> bool {
        self.status.is_terminal() || self.invoice_id.is_some()
    }

    pub fn job_mut(&mut self, id: JobId) -> Option<&mut WorkorderJob> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    /// Resolve a job by full UUID or displayed short id
    pub fn find_job_id(&self, s: &str) -> Option<JobId> {
        let s = s.trim();
        let exact = s.parse::<JobId>().ok();
        let mut matches = self
            .jobs
            .iter()
            .filter(|j| exact.map_or_else(|| j.id.matches_short(s), |id| j.id == id));
        match (matches.next(), matches.next()) {
            (Some(job), None) => Some(job.id),
            _ => None,
        }
    }

    /// Resolve an item by full UUID or displayed short id
    pub fn find_item_id(&self, s: &str) -> Option<ItemId> {
        let s = s.trim();
        let exact = s.parse::<ItemId>().ok();
        let mut matches = self
            .jobs
            .iter()
            .flat_map(|j| j.items.iter())
            .filter(|i| exact.map_or_else(|| i.id.matches_short(s), |id| i.id == id));
        match (matches.next(), matches.next()) {
            (Some(item), None) => Some(item.id),
            _ => None,
        }
    }

    /// Find an item anywhere on the workorder
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut WorkorderItem> {
        self.jobs
            .iter_mut()
            .flat_map(|j| j.items.iter_mut())
            .find(|i| i.id == id)
    }

    /// Remove an item anywhere on the workorder
    pub fn remove_item(&mut self, id: ItemId) -> Option<WorkorderItem> {
        for job in &mut self.jobs {
            if let Some(pos) = job.items.iter().position(|i| i.id == id) {
                return Some(job.items.remove(pos));
            }
        }
        None
    }

    pub fn recompute_totals(&mut self) {
        let rate = self.tax_rate_bps;
        let totals: Totals = self
            .jobs
            .iter_mut()
            .map(|job| {
                for item in &mut job.items {
                    item.line_total = PricedLine::line_total(&*item);
                }
                let totals = Totals::from_lines(&job.items, rate);
                job.subtotal = totals.net();
                job.tax = totals.tax;
                job.total = totals.grand_total;
                totals
            })
            .sum();

        self.subtotal = totals.subtotal;
        self.fees = totals.fees;
        self.discounts = totals.discounts;
        self.tax = totals.tax;
        self.grand_total = totals.grand_total;
        self.updated_at = Utc::now();
    }

    /// Apply a status change and append it to the history
    pub fn change_status(
        &mut self,
        to: WorkorderStatus,
        note: Option<String>,
        actor: Option<String>,
    ) -> Result<WorkorderStatus, (WorkorderStatus, WorkorderStatus)> {
        let from = self.status;
        if !from.can_transition_to(to) {
            return Err((from, to));
        }

        let now = Utc::now();
        match to {
            WorkorderStatus::InProgress if self.started_at.is_none() => {
                self.started_at = Some(now)
            }
            WorkorderStatus::Completed => self.completed_at = Some(now),
            _ => {}
        }

        self.status = to;
        self.history.push(WorkorderStatusHistory {
            from: Some(from),
            to,
            note,
            actor,
            changed_at: now,
        });
        self.updated_at = now;
        Ok(from)
    }

    pub fn item_count(&self) -> usize {
        self.jobs.iter().map(|j| j.items.len()).sum()
    }

    pub fn completed_item_count(&self) -> usize {
        self.jobs
            .iter()
            .flat_map(|j| j.items.iter())
            .filter(|i| i.completed)
            .count()
    }
}
