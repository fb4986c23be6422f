// SPDX-License-Identifier: PMPL-1.0-or-later
//! JSON-file backed metadata store.
//!
//! The whole library is kept in memory and rewritten to disk after every
//! mutation. Writers are serialized; each one stages its change on a copy
//! of the map, writes that copy to a sibling temp file, renames it into
//! place and only then publishes it to readers. A failed write leaves both
//! the file and the in-memory map untouched.

use super::{resolve_in, ImageRecord, MemoryStore, MetadataStore};
use crate::classifier::{ImageRef, MetadataResolver};
use crate::error::{AltbotError, Result};
use crate::metadata::AccessibilityMetadata;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    images: Vec<ImageRecord>,
}

/// Store persisted as a pretty-printed JSON document
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
    writer: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`; a missing file is an empty library
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let file = if path.exists() {
            let json = std::fs::read_to_string(&path)?;
            serde_json::from_str::<StoreFile>(&json)?
        } else {
            StoreFile::default()
        };

        info!(path = %path.display(), images = file.images.len(), "Opened metadata store");

        Ok(Self {
            path,
            inner: MemoryStore::from_records(file.images),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn temp_path(&self) -> PathBuf {
        self.path.with_extension(format!("json.{}.tmp", std::process::id()))
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, ()>> {
        self.writer
            .lock()
            .map_err(|_| AltbotError::PersistenceFailure("store writer lock poisoned".to_string()))
    }

    /// Apply `change` to a staged copy, persist it, then publish it.
    ///
    /// The caller must hold the writer lock.
    fn commit<T>(
        &self,
        _writer: &MutexGuard<'_, ()>,
        change: impl FnOnce(&MemoryStore) -> Result<T>,
    ) -> Result<T> {
        let staged = self.inner.snapshot()?;
        let value = change(&staged)?;

        if let Err(e) = self.persist(&staged) {
            warn!(path = %self.path.display(), error = %e, "Store write failed; change discarded");
            return Err(e);
        }

        self.inner.replace_with(staged)?;
        Ok(value)
    }

    fn persist(&self, staged: &MemoryStore) -> Result<()> {
        let file = StoreFile { images: staged.records()? };
        let json = serde_json::to_string_pretty(&file)?;

        let failure = |e: std::io::Error| {
            AltbotError::PersistenceFailure(format!("{}: {}", self.path.display(), e))
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(failure)?;
        }
        let tmp = self.temp_path();
        std::fs::write(&tmp, json).map_err(failure)?;
        std::fs::rename(&tmp, &self.path).map_err(failure)?;

        debug!(path = %self.path.display(), "Persisted metadata store");
        Ok(())
    }
}

impl MetadataStore for JsonFileStore {
    fn get(&self, id: u64) -> Result<Option<ImageRecord>> {
        self.inner.get(id)
    }

    fn find_by_url(&self, url: &str) -> Result<Option<ImageRecord>> {
        self.inner.find_by_url(url)
    }

    fn upsert(&self, record: ImageRecord) -> Result<()> {
        let writer = self.lock_writer()?;
        self.commit(&writer, |staged| staged.upsert(record))
    }

    fn set_alt_text(&self, id: u64, alt_text: &str) -> Result<ImageRecord> {
        let writer = self.lock_writer()?;
        self.commit(&writer, |staged| staged.set_alt_text(id, alt_text))
    }

    fn set_decorative(&self, id: u64, decorative: bool) -> Result<ImageRecord> {
        let writer = self.lock_writer()?;
        self.commit(&writer, |staged| staged.set_decorative(id, decorative))
    }

    fn delete(&self, id: u64) -> Result<bool> {
        let writer = self.lock_writer()?;
        if self.inner.get(id)?.is_none() {
            return Ok(false);
        }
        self.commit(&writer, |staged| staged.delete(id))
    }

    fn records(&self) -> Result<Vec<ImageRecord>> {
        self.inner.records()
    }
}

impl MetadataResolver for JsonFileStore {
    fn resolve(&self, image: &ImageRef) -> Option<AccessibilityMetadata> {
        resolve_in(self, image)
    }
}
