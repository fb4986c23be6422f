// SPDX-License-Identifier: PMPL-1.0-or-later
//! In-memory metadata store

use super::{resolve_in, ImageRecord, MetadataStore};
use crate::classifier::{ImageRef, MetadataResolver};
use crate::error::{AltbotError, Result};
use crate::metadata::AccessibilityMetadata;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Store backed by a map guarded by a read-write lock
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<u64, ImageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = ImageRecord>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().map(|r| (r.id, r)).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Independent copy of the current map
    pub(crate) fn snapshot(&self) -> Result<MemoryStore> {
        Ok(Self::from_records(self.read()?.values().cloned()))
    }

    /// Swap in the contents of `staged`
    pub(crate) fn replace_with(&self, staged: MemoryStore) -> Result<()> {
        let records = staged
            .records
            .into_inner()
            .map_err(|_| AltbotError::PersistenceFailure("metadata store lock poisoned".to_string()))?;
        *self.write()? = records;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<u64, ImageRecord>>> {
        self.records
            .read()
            .map_err(|_| AltbotError::PersistenceFailure("metadata store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<u64, ImageRecord>>> {
        self.records
            .write()
            .map_err(|_| AltbotError::PersistenceFailure("metadata store lock poisoned".to_string()))
    }

    fn modify(&self, id: u64, f: impl FnOnce(&mut ImageRecord)) -> Result<ImageRecord> {
        let mut records = self.write()?;
        let record = records.get_mut(&id).ok_or(AltbotError::NotFound(id))?;
        f(record);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}

impl MetadataStore for MemoryStore {
    fn get(&self, id: u64) -> Result<Option<ImageRecord>> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn find_by_url(&self, url: &str) -> Result<Option<ImageRecord>> {
        Ok(self.read()?.values().find(|r| r.matches_url(url)).cloned())
    }

    fn upsert(&self, record: ImageRecord) -> Result<()> {
        self.write()?.insert(record.id, record);
        Ok(())
    }

    fn set_alt_text(&self, id: u64, alt_text: &str) -> Result<ImageRecord> {
        self.modify(id, |r| r.metadata.alt_text = alt_text.to_string())
    }

    fn set_decorative(&self, id: u64, decorative: bool) -> Result<ImageRecord> {
        self.modify(id, |r| r.metadata.decorative = decorative)
    }

    fn delete(&self, id: u64) -> Result<bool> {
        Ok(self.write()?.remove(&id).is_some())
    }

    fn records(&self) -> Result<Vec<ImageRecord>> {
        Ok(self.read()?.values().cloned().collect())
    }
}

impl MetadataResolver for MemoryStore {
    fn resolve(&self, image: &ImageRef) -> Option<AccessibilityMetadata> {
        resolve_in(self, image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::from_records([
            ImageRecord::new(2, "b.png"),
            ImageRecord::new(1, "a.png").with_metadata(AccessibilityMetadata::with_alt("A cat")),
        ])
    }

    #[test]
    fn test_get_and_records_order() {
        let store = store();
        assert_eq!(store.get(1).unwrap().unwrap().metadata.alt_text, "A cat");
        assert!(store.get(9).unwrap().is_none());
        let ids: Vec<u64> = store.records().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_set_fields() {
        let store = store();
        let updated = store.set_alt_text(2, "A dog").unwrap();
        assert_eq!(updated.metadata.alt_text, "A dog");
        let updated = store.set_decorative(2, true).unwrap();
        assert!(updated.metadata.decorative);
        assert_eq!(updated.metadata.alt_text, "A dog");
    }

    #[test]
    fn test_missing_id_on_write() {
        let store = store();
        assert!(matches!(store.set_alt_text(99, "x"), Err(AltbotError::NotFound(99))));
        assert!(matches!(store.set_decorative(99, true), Err(AltbotError::NotFound(99))));
    }

    #[test]
    fn test_delete() {
        let store = store();
        assert!(store.delete(1).unwrap());
        assert!(!store.delete(1).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_resolve_by_url_and_id() {
        let store = store();
        assert!(store.resolve(&ImageRef::Attachment(1)).is_some());
        assert!(store.resolve(&ImageRef::Url("b.png?x=1".into())).is_some());
        assert!(store.resolve(&ImageRef::Url("c.png".into())).is_none());
    }
}
