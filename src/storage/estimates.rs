//! Estimate repository
//!
//! Each estimate is stored as one aggregate (header, jobs, items, signature
//! and comments) in estimates.json.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::ShopResult;
use crate::models::{Estimate, EstimateId, EstimateStatus, WorkorderId};

use super::collection::{compare_numbers, next_sequence, Collection, Record};

impl Record for Estimate {
    type Id = EstimateId;

    fn record_id(&self) -> EstimateId {
        self.id
    }
}

/// Criteria for listing estimates; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct EstimateFilter {
    pub status: Option<EstimateStatus>,
    pub customer_id: Option<u64>,
    pub vehicle_id: Option<u64>,
    pub technician_id: Option<u64>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub parent_workorder_id: Option<WorkorderId>,
    pub text: Option<String>,
    pub limit: Option<usize>,
}

impl EstimateFilter {
    pub fn matches(&self, estimate: &Estimate) -> bool {
        let created = estimate.created_at.date_naive();
        self.status.map_or(true, |s| estimate.status == s)
            && self.customer_id.map_or(true, |c| estimate.customer_id == c)
            && self.vehicle_id.map_or(true, |v| estimate.vehicle_id == v)
            && self
                .technician_id
                .map_or(true, |t| estimate.technician_id == Some(t))
            && self.created_from.map_or(true, |d| created >= d)
            && self.created_to.map_or(true, |d| created <= d)
            && self
                .parent_workorder_id
                .map_or(true, |w| estimate.parent_workorder_id == Some(w))
            && self
                .text
                .as_deref()
                .map_or(true, |q| estimate.matches_text(q))
    }
}

pub struct EstimateRepository {
    records: Collection<Estimate>,
}

impl EstimateRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            records: Collection::new(path),
        }
    }

    pub fn load(&self) -> ShopResult<()> {
        self.records.load()
    }

    pub fn get(&self, id: EstimateId) -> ShopResult<Option<Estimate>> {
        self.records.get(id)
    }

    /// Look up by document number, ignoring case
    pub fn get_by_number(&self, number: &str) -> ShopResult<Option<Estimate>> {
        let number = number.trim();
        self.records
            .find_by(|e| e.number.eq_ignore_ascii_case(number))
    }

    /// Resolve a number, full UUID or displayed short id
    pub fn find(&self, identifier: &str) -> ShopResult<Option<Estimate>> {
        let identifier = identifier.trim();
        if let Some(estimate) = self.get_by_number(identifier)? {
            return Ok(Some(estimate));
        }
        if let Ok(id) = identifier.parse::<EstimateId>() {
            return self.get(id);
        }
        let matches = self.records.filter(|e| e.id.matches_short(identifier))?;
        // An ambiguous short id resolves to nothing
        Ok(match matches.len() {
            1 => matches.into_iter().next(),
            _ => None,
        })
    }

    /// Estimates matching the filter, newest number first
    pub fn list(&self, filter: &EstimateFilter) -> ShopResult<Vec<Estimate>> {
        let mut estimates = self.records.filter(|e| filter.matches(e))?;
        estimates.sort_by(|a, b| {
            compare_numbers(&b.number, &a.number).then(b.created_at.cmp(&a.created_at))
        });
        if let Some(limit) = filter.limit {
            estimates.truncate(limit);
        }
        Ok(estimates)
    }

    pub fn get_all(&self) -> ShopResult<Vec<Estimate>> {
        self.list(&EstimateFilter::default())
    }

    /// Sub-estimates raised against a workorder
    pub fn by_parent_workorder(&self, workorder_id: WorkorderId) -> ShopResult<Vec<Estimate>> {
        self.list(&EstimateFilter {
            parent_workorder_id: Some(workorder_id),
            ..Default::default()
        })
    }

    pub fn next_number(&self, prefix: &str) -> ShopResult<String> {
        let all = self.records.all()?;
        Ok(next_sequence(prefix, all.iter().map(|e| e.number.as_str())))
    }

    pub fn upsert(&self, estimate: Estimate) -> ShopResult<()> {
        self.records.upsert(estimate).map(|_| ())
    }

    /// Replace the aggregate and persist it, rolling back memory on failure
    pub fn commit(&self, estimate: Estimate) -> ShopResult<Option<Estimate>> {
        self.records.commit(estimate)
    }

    /// Remove and persist, rolling back memory on failure
    pub fn commit_removal(&self, id: EstimateId) -> ShopResult<Option<Estimate>> {
        self.records.commit_removal(id)
    }

    /// Undo a committed change
    pub fn revert(&self, id: EstimateId, previous: Option<Estimate>) -> ShopResult<()> {
        self.records.revert(id, previous)
    }

    pub fn count(&self) -> ShopResult<usize> {
        self.records.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, EstimateRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = EstimateRepository::new(temp_dir.path().join("estimates.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_find_by_number_and_short_id() {
        let (_temp, repo) = create_test_repo();
        let estimate = Estimate::new("EST-000001", 10, 20);
        let id = estimate.id;
        repo.commit(estimate).unwrap();

        assert_eq!(repo.find("est-000001").unwrap().unwrap().id, id);
        assert_eq!(repo.find(&id.to_string()).unwrap().unwrap().id, id);
        let full = serde_json::to_value(id).unwrap();
        assert_eq!(repo.find(full.as_str().unwrap()).unwrap().unwrap().id, id);
        assert!(repo.find("EST-999999").unwrap().is_none());
    }

    #[test]
    fn test_list_filters_and_orders() {
        let (_temp, repo) = create_test_repo();
        let mut first = Estimate::new("EST-000001", 1, 100);
        first.notes = "Brake noise".into();
        let mut second = Estimate::new("EST-000002", 1, 101);
        second.status = EstimateStatus::Sent;
        let third = Estimate::new("EST-000003", 2, 102);
        for e in [first, second, third] {
            repo.upsert(e).unwrap();
        }

        let all = repo.get_all().unwrap();
        let numbers: Vec<_> = all.iter().map(|e| e.number.as_str()).collect();
        assert_eq!(numbers, ["EST-000003", "EST-000002", "EST-000001"]);

        let by_customer = repo
            .list(&EstimateFilter {
                customer_id: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_customer.len(), 2);

        let sent = repo
            .list(&EstimateFilter {
                status: Some(EstimateStatus::Sent),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(sent[0].number, "EST-000002");

        let text = repo
            .list(&EstimateFilter {
                text: Some("brake".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(text.len(), 1);

        let limited = repo
            .list(&EstimateFilter {
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(limited[0].number, "EST-000003");
    }

    #[test]
    fn test_list_orders_past_six_digit_numbers() {
        let (_temp, repo) = create_test_repo();
        for number in ["EST-999999", "EST-1000000", "EST-000010"] {
            repo.upsert(Estimate::new(number, 1, 1)).unwrap();
        }

        let listed = repo.list(&EstimateFilter::default()).unwrap();
        let numbers: Vec<_> = listed.iter().map(|e| e.number.as_str()).collect();
        assert_eq!(numbers, ["EST-1000000", "EST-999999", "EST-000010"]);
    }

    #[test]
    fn test_next_number() {
        let (_temp, repo) = create_test_repo();
        assert_eq!(repo.next_number("EST-").unwrap(), "EST-000001");
        repo.upsert(Estimate::new("EST-000041", 1, 1)).unwrap();
        assert_eq!(repo.next_number("EST-").unwrap(), "EST-000042");
    }

    #[test]
    fn test_save_and_reload() {
        let (temp, repo) = create_test_repo();
        let estimate = Estimate::new("EST-000005", 3, 4);
        let id = estimate.id;
        repo.commit(estimate).unwrap();

        let reloaded = EstimateRepository::new(temp.path().join("estimates.json"));
        reloaded.load().unwrap();
        assert_eq!(reloaded.get(id).unwrap().unwrap().number, "EST-000005");
    }
}
