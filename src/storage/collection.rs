//! Keyed record collection backed by one JSON file
//!
//! Every repository wraps a `Collection`. Records are held in memory behind
//! an `RwLock` and the whole file is rewritten atomically on save.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{ShopError, ShopResult};

use super::file_io::{read_json, write_json_atomic};

/// A record stored in a collection
pub trait Record: Clone + Serialize + DeserializeOwned {
    type Id: Copy + Eq + Hash;

    fn record_id(&self) -> Self::Id;
}

#[derive(Serialize, Deserialize)]
#[serde(bound = "T: Serialize + DeserializeOwned")]
struct FileData<T> {
    #[serde(default)]
    records: Vec<T>,
}

impl<T> Default for FileData<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

pub struct Collection<T: Record> {
    path: PathBuf,
    data: RwLock<HashMap<T::Id, T>>,
}

impl<T: Record> Collection<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> ShopResult<RwLockReadGuard<'_, HashMap<T::Id, T>>> {
        self.data
            .read()
            .map_err(|e| ShopError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> ShopResult<RwLockWriteGuard<'_, HashMap<T::Id, T>>> {
        self.data
            .write()
            .map_err(|e| ShopError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    pub fn load(&self) -> ShopResult<()> {
        let file_data: FileData<T> = read_json(&self.path)?;
        let mut data = self.write()?;
        data.clear();
        for record in file_data.records {
            data.insert(record.record_id(), record);
        }
        Ok(())
    }

    pub fn save(&self) -> ShopResult<()> {
        let data = self.read()?;
        let file_data = FileData {
            records: data.values().cloned().collect(),
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: T::Id) -> ShopResult<Option<T>> {
        Ok(self.read()?.get(&id).cloned())
    }

    /// First record matching the predicate
    pub fn find_by<F>(&self, predicate: F) -> ShopResult<Option<T>>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self.read()?.values().find(|r| predicate(r)).cloned())
    }

    /// All records matching the predicate, in no particular order
    pub fn filter<F>(&self, predicate: F) -> ShopResult<Vec<T>>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self
            .read()?
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect())
    }

    pub fn all(&self) -> ShopResult<Vec<T>> {
        self.filter(|_| true)
    }

    pub fn count(&self) -> ShopResult<usize> {
        Ok(self.read()?.len())
    }

    /// Insert or replace in memory only
    pub fn upsert(&self, record: T) -> ShopResult<Option<T>> {
        let mut data = self.write()?;
        Ok(data.insert(record.record_id(), record))
    }

    /// Remove from memory only
    pub fn remove(&self, id: T::Id) -> ShopResult<Option<T>> {
        Ok(self.write()?.remove(&id))
    }

    /// Insert or replace a record and persist the file
    ///
    /// When the write fails the in-memory map is restored to what it held
    /// before the call, so memory never runs ahead of disk.
    pub fn commit(&self, record: T) -> ShopResult<Option<T>> {
        let id = record.record_id();
        let previous = self.upsert(record)?;
        if let Err(e) = self.save() {
            self.restore(id, previous)?;
            return Err(e);
        }
        Ok(previous)
    }

    /// Remove a record and persist the file, restoring it if the write fails
    pub fn commit_removal(&self, id: T::Id) -> ShopResult<Option<T>> {
        let previous = self.remove(id)?;
        if previous.is_none() {
            return Ok(None);
        }
        if let Err(e) = self.save() {
            self.restore(id, previous)?;
            return Err(e);
        }
        Ok(previous)
    }

    /// Put back a value captured before a change: `None` means absent
    pub fn restore(&self, id: T::Id, previous: Option<T>) -> ShopResult<()> {
        let mut data = self.write()?;
        match previous {
            Some(record) => {
                data.insert(id, record);
            }
            None => {
                data.remove(&id);
            }
        }
        Ok(())
    }

    /// Undo a committed change and persist the restored state
    pub fn revert(&self, id: T::Id, previous: Option<T>) -> ShopResult<()> {
        self.restore(id, previous)?;
        self.save()
    }
}

/// Next document number for `prefix`: one past the highest existing sequence
///
/// Numbers are rendered as the prefix followed by a six-digit sequence.
/// Numbers with another prefix or a non-numeric suffix are ignored.
pub fn next_sequence<'a, I>(prefix: &str, numbers: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let highest = numbers
        .into_iter()
        .filter_map(|n| n.strip_prefix(prefix))
        .filter_map(|seq| seq.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{}{:06}", prefix, highest + 1)
}

/// Order two document numbers by their numeric sequence
///
/// Sequences outgrow the six-digit padding, so "EST-1000000" follows
/// "EST-999999". Numbers without a numeric suffix sort first, by text.
pub fn compare_numbers(a: &str, b: &str) -> Ordering {
    sequence_of(a)
        .cmp(&sequence_of(b))
        .then_with(|| a.cmp(b))
}

fn sequence_of(number: &str) -> Option<u64> {
    number
        .rsplit_once('-')
        .and_then(|(_, seq)| seq.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u32,
        body: String,
    }

    impl Record for Note {
        type Id = u32;
        fn record_id(&self) -> u32 {
            self.id
        }
    }

    fn note(id: u32, body: &str) -> Note {
        Note {
            id,
            body: body.into(),
        }
    }

    #[test]
    fn test_commit_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.json");
        let collection = Collection::<Note>::new(path.clone());

        collection.commit(note(1, "brakes")).unwrap();

        let reloaded = Collection::<Note>::new(path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.get(1).unwrap(), Some(note(1, "brakes")));
    }

    #[test]
    fn test_failed_commit_rolls_back() {
        let temp_dir = TempDir::new().unwrap();
        // A directory at the file path makes the rename fail
        let path = temp_dir.path().join("notes.json");
        std::fs::create_dir_all(&path).unwrap();
        let collection = Collection::<Note>::new(path);
        collection.upsert(note(1, "original")).unwrap();

        assert!(collection.commit(note(1, "changed")).is_err());
        assert!(collection.commit(note(2, "new")).is_err());

        assert_eq!(collection.get(1).unwrap(), Some(note(1, "original")));
        assert_eq!(collection.get(2).unwrap(), None);
    }

    #[test]
    fn test_commit_removal() {
        let temp_dir = TempDir::new().unwrap();
        let collection = Collection::<Note>::new(temp_dir.path().join("notes.json"));
        collection.commit(note(7, "x")).unwrap();

        assert!(collection.commit_removal(7).unwrap().is_some());
        assert!(collection.commit_removal(7).unwrap().is_none());
        assert_eq!(collection.count().unwrap(), 0);
    }

    #[test]
    fn test_compare_numbers_past_six_digits() {
        assert_eq!(compare_numbers("EST-1000000", "EST-999999"), Ordering::Greater);
        assert_eq!(compare_numbers("EST-000002", "EST-000010"), Ordering::Less);
        assert_eq!(compare_numbers("WO-000007", "WO-000007"), Ordering::Equal);
        assert_eq!(compare_numbers("EST-draft", "EST-000001"), Ordering::Less);

        let mut numbers = vec!["EST-999999", "EST-1000000", "EST-000001"];
        numbers.sort_by(|a, b| compare_numbers(b, a));
        assert_eq!(numbers, ["EST-1000000", "EST-999999", "EST-000001"]);
    }

    #[test]
    fn test_next_sequence() {
        assert_eq!(next_sequence("EST-", std::iter::empty()), "EST-000001");
        assert_eq!(
            next_sequence("EST-", ["EST-000009", "EST-000041", "WO-000100", "EST-abc"]),
            "EST-000042"
        );
    }
}
