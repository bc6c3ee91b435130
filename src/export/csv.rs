//! CSV export of estimate and invoice registers
//!
//! One row per document, amounts as plain decimals so spreadsheets can sum
//! them.

use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{ShopError, ShopResult};
use crate::models::Money;
use crate::storage::{EstimateFilter, InvoiceFilter, Storage};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct EstimateRow {
    number: String,
    status: String,
    customer_id: u64,
    vehicle_id: u64,
    technician_id: Option<u64>,
    jobs: usize,
    subtotal: String,
    fees: String,
    discounts: String,
    tax: String,
    grand_total: String,
    expiration_date: Option<NaiveDate>,
    workorder: Option<String>,
    created: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct InvoiceRow {
    number: String,
    source: String,
    status: String,
    customer_id: u64,
    vehicle_id: u64,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    grand_total: String,
    amount_paid: String,
    balance_due: String,
}

fn amount(m: Money) -> String {
    m.format_with_symbol("")
}

fn export_err(e: ::csv::Error) -> ShopError {
    ShopError::Export(e.to_string())
}

/// Write every estimate, oldest number first
pub fn export_estimates_csv<W: Write>(storage: &Storage, writer: &mut W) -> ShopResult<()> {
    let mut estimates = storage.estimates.list(&EstimateFilter::default())?;
    estimates.reverse();

    let mut out = ::csv::Writer::from_writer(writer);
    for e in estimates {
        let workorder = match e.workorder_id {
            Some(id) => storage.workorders.get(id)?.map(|w| w.number),
            None => None,
        };
        out.serialize(EstimateRow {
            number: e.number,
            status: e.status.to_string(),
            customer_id: e.customer_id,
            vehicle_id: e.vehicle_id,
            technician_id: e.technician_id,
            jobs: e.jobs.len(),
            subtotal: amount(e.subtotal),
            fees: amount(e.fees),
            discounts: amount(e.discounts),
            tax: amount(e.tax),
            grand_total: amount(e.grand_total),
            expiration_date: e.expiration_date,
            workorder,
            created: e.created_at.date_naive(),
        })
        .map_err(export_err)?;
    }
    out.flush().map_err(|e| ShopError::Export(e.to_string()))
}

/// Write every invoice, oldest number first
pub fn export_invoices_csv<W: Write>(storage: &Storage, writer: &mut W) -> ShopResult<()> {
    let mut invoices = storage.invoices.list(&InvoiceFilter::default())?;
    invoices.reverse();

    let mut out = ::csv::Writer::from_writer(writer);
    for i in invoices {
        out.serialize(InvoiceRow {
            number: i.number,
            source: i.source.to_string(),
            status: i.status.to_string(),
            customer_id: i.customer_id,
            vehicle_id: i.vehicle_id,
            issue_date: i.issue_date,
            due_date: i.due_date,
            grand_total: amount(i.grand_total),
            amount_paid: amount(i.amount_paid),
            balance_due: amount(i.balance_due),
        })
        .map_err(export_err)?;
    }
    out.flush().map_err(|e| ShopError::Export(e.to_string()))
}
