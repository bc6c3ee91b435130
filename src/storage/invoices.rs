//! Invoice repository

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::ShopResult;
use crate::models::{Invoice, InvoiceId, InvoiceSource, InvoiceStatus};

use super::collection::{compare_numbers, next_sequence, Collection, Record};

impl Record for Invoice {
    type Id = InvoiceId;

    fn record_id(&self) -> InvoiceId {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<u64>,
    /// Only unpaid or partially paid invoices past their due date on this day
    pub overdue_on: Option<NaiveDate>,
    pub limit: Option<usize>,
}

impl InvoiceFilter {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.status.map_or(true, |s| invoice.status == s)
            && self.customer_id.map_or(true, |c| invoice.customer_id == c)
            && self.overdue_on.map_or(true, |d| invoice.is_overdue(d))
    }
}

pub struct InvoiceRepository {
    records: Collection<Invoice>,
}

impl InvoiceRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            records: Collection::new(path),
        }
    }

    pub fn load(&self) -> ShopResult<()> {
        self.records.load()
    }

    pub fn get(&self, id: InvoiceId) -> ShopResult<Option<Invoice>> {
        self.records.get(id)
    }

    pub fn get_by_number(&self, number: &str) -> ShopResult<Option<Invoice>> {
        let number = number.trim();
        self.records
            .find_by(|i| i.number.eq_ignore_ascii_case(number))
    }

    pub fn get_by_source(&self, source: InvoiceSource) -> ShopResult<Option<Invoice>> {
        self.records.find_by(|i| i.source == source)
    }

    pub fn find(&self, identifier: &str) -> ShopResult<Option<Invoice>> {
        let identifier = identifier.trim();
        if let Some(invoice) = self.get_by_number(identifier)? {
            return Ok(Some(invoice));
        }
        if let Ok(id) = identifier.parse::<InvoiceId>() {
            return self.get(id);
        }
        let matches = self.records.filter(|i| i.id.matches_short(identifier))?;
        Ok(match matches.len() {
            1 => matches.into_iter().next(),
            _ => None,
        })
    }

    pub fn list(&self, filter: &InvoiceFilter) -> ShopResult<Vec<Invoice>> {
        let mut invoices = self.records.filter(|i| filter.matches(i))?;
        invoices.sort_by(|a, b| compare_numbers(&b.number, &a.number));
        if let Some(limit) = filter.limit {
            invoices.truncate(limit);
        }
        Ok(invoices)
    }

    pub fn get_all(&self) -> ShopResult<Vec<Invoice>> {
        self.list(&InvoiceFilter::default())
    }

    pub fn next_number(&self, prefix: &str) -> ShopResult<String> {
        let all = self.records.all()?;
        Ok(next_sequence(prefix, all.iter().map(|i| i.number.as_str())))
    }

    pub fn commit(&self, invoice: Invoice) -> ShopResult<Option<Invoice>> {
        self.records.commit(invoice)
    }

    pub fn commit_removal(&self, id: InvoiceId) -> ShopResult<Option<Invoice>> {
        self.records.commit_removal(id)
    }

    pub fn count(&self) -> ShopResult<usize> {
        self.records.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EstimateId, WorkorderId};
    use tempfile::TempDir;

    fn invoice(number: &str, source: InvoiceSource) -> Invoice {
        let issued = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let due = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        Invoice::new(number, source, 5, 6, 0, Vec::new(), issued, due)
    }

    #[test]
    fn test_lookup_by_source() {
        let temp_dir = TempDir::new().unwrap();
        let repo = InvoiceRepository::new(temp_dir.path().join("invoices.json"));
        let wo = WorkorderId::new();
        repo.commit(invoice("INV-000001", InvoiceSource::Workorder(wo)))
            .unwrap();

        assert!(repo
            .get_by_source(InvoiceSource::Workorder(wo))
            .unwrap()
            .is_some());
        assert!(repo
            .get_by_source(InvoiceSource::Estimate(EstimateId::new()))
            .unwrap()
            .is_none());
        assert!(repo.find("inv-000001").unwrap().is_some());
    }

    #[test]
    fn test_overdue_filter() {
        let temp_dir = TempDir::new().unwrap();
        let repo = InvoiceRepository::new(temp_dir.path().join("invoices.json"));
        let mut open = invoice("INV-000001", InvoiceSource::Estimate(EstimateId::new()));
        // A zero-total invoice is paid on creation; give this one a balance
        open.balance_due = crate::models::Money::from_cents(100);
        open.status = InvoiceStatus::Unpaid;
        repo.commit(open).unwrap();
        repo.commit(invoice("INV-000002", InvoiceSource::Estimate(EstimateId::new())))
            .unwrap();

        let overdue = repo
            .list(&InvoiceFilter {
                overdue_on: NaiveDate::from_ymd_opt(2026, 4, 15),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].number, "INV-000001");
    }
}
