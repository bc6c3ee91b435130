//! Invoice model
//!
//! Invoices are the terminal artifact of the lifecycle, produced either
//! directly from an approved estimate or from a completed workorder.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::estimate::EstimateItem;
use super::ids::{EstimateId, InvoiceId, WorkorderId};
use super::line_item::{ItemType, PricedLine, Totals};
use super::money::{Money, Quantity};
use super::workorder::WorkorderItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "unpaid" | "open" => Some(Self::Unpaid),
            "partial" => Some(Self::Partial),
            "paid" => Some(Self::Paid),
            "void" => Some(Self::Void),
            _ => None,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unpaid => "unpaid",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Void => "void",
        };
        write!(f, "{}", s)
    }
}

/// What an invoice was generated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum InvoiceSource {
    Estimate(EstimateId),
    Workorder(WorkorderId),
}

impl fmt::Display for InvoiceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Estimate(id) => write!(f, "estimate {}", id),
            Self::Workorder(id) => write!(f, "workorder {}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub item_type: ItemType,
    pub description: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    #[serde(default)]
    pub taxable: bool,
    #[serde(default)]
    pub line_total: Money,
}

impl PricedLine for InvoiceLine {
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

impl From<&EstimateItem> for InvoiceLine {
    fn from(item: &EstimateItem) -> Self {
        Self {
            item_type: item.item_type,
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            taxable: item.taxable,
            line_total: PricedLine::line_total(item),
        }
    }
}

impl From<&WorkorderItem> for InvoiceLine {
    fn from(item: &WorkorderItem) -> Self {
        Self {
            item_type: item.item_type,
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            taxable: item.taxable,
            line_total: PricedLine::line_total(item),
        }
    }
}

/// Lines billed under one job title; tax is rounded per section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSection {
    pub title: String,
    pub lines: Vec<InvoiceLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub amount: Money,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub reference: Option<String>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub number: String,
    pub source: InvoiceSource,
    pub customer_id: u64,
    pub vehicle_id: u64,
    #[serde(default)]
    pub tax_rate_bps: u32,
    pub sections: Vec<InvoiceSection>,

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
    pub amount_paid: Money,
    #[serde(default)]
    pub balance_due: Money,

    #[serde(default)]
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub void_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: impl Into<String>,
        source: InvoiceSource,
        customer_id: u64,
        vehicle_id: u64,
        tax_rate_bps: u32,
        sections: Vec<InvoiceSection>,
        issue_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        let mut invoice = Self {
            id: InvoiceId::new(),
            number: number.into(),
            source,
            customer_id,
            vehicle_id,
            tax_rate_bps,
            sections,
            subtotal: Money::zero(),
            fees: Money::zero(),
            discounts: Money::zero(),
            tax: Money::zero(),
            grand_total: Money::zero(),
            amount_paid: Money::zero(),
            balance_due: Money::zero(),
            status: InvoiceStatus::Unpaid,
            issue_date,
            due_date,
            payments: Vec::new(),
            void_reason: None,
            created_at: now,
            updated_at: now,
        };
        invoice.recompute_totals();
        invoice
    }

    pub fn recompute_totals(&mut self) {
        let rate = self.tax_rate_bps;
        let totals: Totals = self
            .sections
            .iter_mut()
            .map(|section| {
                for line in &mut section.lines {
                    line.line_total = PricedLine::line_total(&*line);
                }
                Totals::from_lines(&section.lines, rate)
            })
            .sum();

        self.subtotal = totals.subtotal;
        self.fees = totals.fees;
        self.discounts = totals.discounts;
        self.tax = totals.tax;
        self.grand_total = totals.grand_total;
        self.amount_paid = self.payments.iter().map(|p| p.amount).sum();
        self.balance_due = self.grand_total - self.amount_paid;
        self.refresh_status();
    }

    fn refresh_status(&mut self) {
        if self.status == InvoiceStatus::Void {
            return;
        }
        self.status = if !self.balance_due.is_positive() {
            InvoiceStatus::Paid
        } else if self.amount_paid.is_positive() {
            InvoiceStatus::Partial
        } else {
            InvoiceStatus::Unpaid
        };
    }

    /// Apply a payment; the caller validates the amount
    pub fn apply_payment(&mut self, payment: Payment) {
        self.payments.push(payment);
        self.amount_paid = self.payments.iter().map(|p| p.amount).sum();
        self.balance_due = self.grand_total - self.amount_paid;
        self.refresh_status();
        self.updated_at = Utc::now();
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.status, InvoiceStatus::Unpaid | InvoiceStatus::Partial)
            && today > self.due_date
    }

    pub fn line_count(&self) -> usize {
        self.sections.iter().map(|s| s.lines.len()).sum()
    }
}
