//! Invoice service
//!
//! Issues invoices for converted estimates and completed workorders and
//! tracks payments against them.

use chrono::{Duration, Utc};
use tracing::info;

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::error::{ShopError, ShopResult};
use crate::models::{
    Invoice, InvoiceId, InvoiceSection, InvoiceSource, InvoiceStatus, Money, Payment,
};
use crate::storage::{InvoiceFilter, Storage};

use super::today;

pub struct InvoiceService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> InvoiceService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    /// Number, persist and audit a new invoice
    ///
    /// Callers record the invoice id on the source document and remove the
    /// invoice again if that fails.
    pub(crate) fn issue(
        &self,
        source: InvoiceSource,
        customer_id: u64,
        vehicle_id: u64,
        tax_rate_bps: u32,
        sections: Vec<InvoiceSection>,
    ) -> ShopResult<Invoice> {
        let sections: Vec<_> = sections
            .into_iter()
            .filter(|s| !s.lines.is_empty())
            .collect();
        if sections.is_empty() {
            return Err(ShopError::Validation(format!(
                "Nothing to invoice for {}",
                source
            )));
        }
        if self.storage.invoices.get_by_source(source)?.is_some() {
            return Err(ShopError::Duplicate {
                entity_type: "Invoice",
                identifier: source.to_string(),
            });
        }

        let number = self
            .storage
            .invoices
            .next_number(&self.settings.prefixes.invoice)?;
        let issue_date = today();
        let due_date = issue_date + Duration::days(i64::from(self.settings.invoice_due_days));

        let invoice = Invoice::new(
            number,
            source,
            customer_id,
            vehicle_id,
            tax_rate_bps,
            sections,
            issue_date,
            due_date,
        );

        self.storage.invoices.commit(invoice.clone())?;
        self.storage.log_create(
            EntityType::Invoice,
            invoice.id.to_string(),
            Some(invoice.number.clone()),
            &invoice,
        )?;

        info!(
            invoice = %invoice.number,
            source = %source,
            total = %invoice.grand_total,
            "invoice issued"
        );
        Ok(invoice)
    }

    /// Remove an invoice whose source document could not be updated
    pub(crate) fn withdraw(&self, id: InvoiceId) -> ShopResult<()> {
        self.storage.invoices.commit_removal(id)?;
        Ok(())
    }

    pub fn get(&self, id: InvoiceId) -> ShopResult<Option<Invoice>> {
        self.storage.invoices.get(id)
    }

    pub fn find(&self, identifier: &str) -> ShopResult<Option<Invoice>> {
        self.storage.invoices.find(identifier)
    }

    pub fn require(&self, identifier: &str) -> ShopResult<Invoice> {
        self.find(identifier)?
            .ok_or_else(|| ShopError::invoice_not_found(identifier))
    }

    pub fn list(&self, filter: &InvoiceFilter) -> ShopResult<Vec<Invoice>> {
        self.storage.invoices.list(filter)
    }

    /// Apply a payment; it must be positive and no larger than the balance due
    pub fn record_payment(
        &self,
        id: InvoiceId,
        amount: Money,
        method: &str,
        reference: Option<String>,
    ) -> ShopResult<Invoice> {
        let mut invoice = self
            .storage
            .invoices
            .get(id)?
            .ok_or_else(|| ShopError::invoice_not_found(id.to_string()))?;

        match invoice.status {
            InvoiceStatus::Void => {
                return Err(ShopError::Payment(format!(
                    "Invoice {} is void",
                    invoice.number
                )))
            }
            InvoiceStatus::Paid => {
                return Err(ShopError::Payment(format!(
                    "Invoice {} is already paid in full",
                    invoice.number
                )))
            }
            InvoiceStatus::Unpaid | InvoiceStatus::Partial => {}
        }
        if !amount.is_positive() {
            return Err(ShopError::Payment(
                "Payment amount must be greater than zero".into(),
            ));
        }
        if amount > invoice.balance_due {
            return Err(ShopError::Payment(format!(
                "Payment of {} exceeds the balance due of {}",
                amount, invoice.balance_due
            )));
        }

        let before = invoice.clone();
        invoice.apply_payment(Payment {
            amount,
            method: method.trim().to_string(),
            reference: reference.filter(|r| !r.trim().is_empty()),
            received_at: Utc::now(),
        });

        self.storage.invoices.commit(invoice.clone())?;
        self.storage.log_update(
            EntityType::Invoice,
            invoice.id.to_string(),
            Some(invoice.number.clone()),
            &before,
            &invoice,
            Some(format!(
                "payment {}, balance_due: {} -> {}",
                amount, before.balance_due, invoice.balance_due
            )),
        )?;

        info!(
            invoice = %invoice.number,
            amount = %amount,
            status = %invoice.status,
            "payment recorded"
        );
        Ok(invoice)
    }

    /// Void an invoice that has not received any payment
    pub fn void(&self, id: InvoiceId, reason: &str) -> ShopResult<Invoice> {
        let mut invoice = self
            .storage
            .invoices
            .get(id)?
            .ok_or_else(|| ShopError::invoice_not_found(id.to_string()))?;

        if invoice.status == InvoiceStatus::Void {
            return Err(ShopError::transition("Invoice", invoice.status, InvoiceStatus::Void));
        }
        if !invoice.payments.is_empty() {
            return Err(ShopError::Payment(format!(
                "Invoice {} has payments recorded and cannot be voided",
                invoice.number
            )));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ShopError::Validation("A void reason is required".into()));
        }

        let before = invoice.clone();
        invoice.status = InvoiceStatus::Void;
        invoice.void_reason = Some(reason.to_string());
        invoice.updated_at = Utc::now();

        self.storage.invoices.commit(invoice.clone())?;
        self.storage.log_update(
            EntityType::Invoice,
            invoice.id.to_string(),
            Some(invoice.number.clone()),
            &before,
            &invoice,
            None,
        )?;

        info!(invoice = %invoice.number, "invoice voided");
        Ok(invoice)
    }
}
