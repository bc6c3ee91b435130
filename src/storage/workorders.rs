//! Workorder repository

use std::path::PathBuf;

use crate::error::ShopResult;
use crate::models::{EstimateId, Workorder, WorkorderId, WorkorderStatus};

use super::collection::{compare_numbers, next_sequence, Collection, Record};

impl Record for Workorder {
    type Id = WorkorderId;

    fn record_id(&self) -> WorkorderId {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkorderFilter {
    pub status: Option<WorkorderStatus>,
    pub customer_id: Option<u64>,
    pub technician_id: Option<u64>,
    pub limit: Option<usize>,
}

impl WorkorderFilter {
    pub fn matches(&self, workorder: &Workorder) -> bool {
        self.status.map_or(true, |s| workorder.status == s)
            && self.customer_id.map_or(true, |c| workorder.customer_id == c)
            && self
                .technician_id
                .map_or(true, |t| workorder.technician_id == Some(t))
    }
}

pub struct WorkorderRepository {
    records: Collection<Workorder>,
}

impl WorkorderRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            records: Collection::new(path),
        }
    }

    pub fn load(&self) -> ShopResult<()> {
        self.records.load()
    }

    pub fn get(&self, id: WorkorderId) -> ShopResult<Option<Workorder>> {
        self.records.get(id)
    }

    pub fn get_by_number(&self, number: &str) -> ShopResult<Option<Workorder>> {
        let number = number.trim();
        self.records
            .find_by(|w| w.number.eq_ignore_ascii_case(number))
    }

    /// The workorder created from an estimate, if any
    pub fn get_by_estimate(&self, estimate_id: EstimateId) -> ShopResult<Option<Workorder>> {
        self.records.find_by(|w| w.estimate_id == estimate_id)
    }

    /// Resolve a number, full UUID or displayed short id
    pub fn find(&self, identifier: &str) -> ShopResult<Option<Workorder>> {
        let identifier = identifier.trim();
        if let Some(workorder) = self.get_by_number(identifier)? {
            return Ok(Some(workorder));
        }
        if let Ok(id) = identifier.parse::<WorkorderId>() {
            return self.get(id);
        }
        let matches = self.records.filter(|w| w.id.matches_short(identifier))?;
        Ok(match matches.len() {
            1 => matches.into_iter().next(),
            _ => None,
        })
    }

    pub fn list(&self, filter: &WorkorderFilter) -> ShopResult<Vec<Workorder>> {
        let mut workorders = self.records.filter(|w| filter.matches(w))?;
        workorders.sort_by(|a, b| compare_numbers(&b.number, &a.number));
        if let Some(limit) = filter.limit {
            workorders.truncate(limit);
        }
        Ok(workorders)
    }

    pub fn get_all(&self) -> ShopResult<Vec<Workorder>> {
        self.list(&WorkorderFilter::default())
    }

    pub fn next_number(&self, prefix: &str) -> ShopResult<String> {
        let all = self.records.all()?;
        Ok(next_sequence(prefix, all.iter().map(|w| w.number.as_str())))
    }

    pub fn commit(&self, workorder: Workorder) -> ShopResult<Option<Workorder>> {
        self.records.commit(workorder)
    }

    pub fn commit_removal(&self, id: WorkorderId) -> ShopResult<Option<Workorder>> {
        self.records.commit_removal(id)
    }

    pub fn revert(&self, id: WorkorderId, previous: Option<Workorder>) -> ShopResult<()> {
        self.records.revert(id, previous)
    }

    pub fn count(&self) -> ShopResult<usize> {
        self.records.count()
    }
}
