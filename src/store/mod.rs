// SPDX-License-Identifier: PMPL-1.0-or-later
//! Image metadata stores.
//!
//! A store holds one [`ImageRecord`] per media item, keyed by attachment id.
//! Decorative flags are normalized to a strict bool when records are read,
//! so nothing downstream ever sees the legacy `"0"`/`"1"`/absent values.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::classifier::{ImageRef, MetadataResolver};
use crate::error::Result;
use crate::metadata::{classify, AccessibilityMetadata, Classification};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Resized variants the host generates: `photo-300x200.jpg`
static SIZE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d+x\d+(\.[A-Za-z0-9]+)$").expect("valid regex"));

/// A media library item and its accessibility metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub metadata: AccessibilityMetadata,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_mime_type() -> String {
    "image/jpeg".to_string()
}

impl ImageRecord {
    pub fn new(id: u64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            mime_type: default_mime_type(),
            title: String::new(),
            metadata: AccessibilityMetadata::default(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: AccessibilityMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_mime_type(mut self, mime_type: &str) -> Self {
        self.mime_type = mime_type.to_string();
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn classification(&self) -> Classification {
        classify(&self.metadata)
    }

    /// Whether `url` points at this record's file, ignoring query strings
    /// and resized-variant suffixes
    pub fn matches_url(&self, url: &str) -> bool {
        if self.url.is_empty() {
            return false;
        }
        let own = canonical_url(&self.url);
        let other = canonical_url(url);
        own == other || SIZE_SUFFIX.replace(&other, "$1") == own
    }
}

fn canonical_url(url: &str) -> String {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].trim().to_string()
}

/// Persistent map from attachment id to image record
pub trait MetadataStore: Send + Sync {
    fn get(&self, id: u64) -> Result<Option<ImageRecord>>;

    fn find_by_url(&self, url: &str) -> Result<Option<ImageRecord>>;

    /// Insert or replace a record
    fn upsert(&self, record: ImageRecord) -> Result<()>;

    /// Replace the alt text of an existing record
    fn set_alt_text(&self, id: u64, alt_text: &str) -> Result<ImageRecord>;

    /// Set or clear the decorative flag of an existing record
    fn set_decorative(&self, id: u64, decorative: bool) -> Result<ImageRecord>;

    /// Remove a record; returns whether it existed
    fn delete(&self, id: u64) -> Result<bool>;

    /// All records in ascending id order
    fn records(&self) -> Result<Vec<ImageRecord>>;
}

/// Resolve an embedded image against any store
pub fn resolve_in<S>(store: &S, image: &ImageRef) -> Option<AccessibilityMetadata>
where
    S: MetadataStore + ?Sized,
{
    let record = match image {
        ImageRef::Attachment(id) => store.get(*id),
        ImageRef::Url(url) => store.find_by_url(url),
    };
    match record {
        Ok(record) => record.map(|r| r.metadata),
        Err(e) => {
            tracing::warn!(%image, error = %e, "Metadata lookup failed; treating image as unknown");
            None
        }
    }
}

/// Adapter exposing a borrowed store as a [`MetadataResolver`]
pub struct StoreResolver<'a, S: ?Sized>(pub &'a S);

impl<S> MetadataResolver for StoreResolver<'_, S>
where
    S: MetadataStore + ?Sized,
{
    fn resolve(&self, image: &ImageRef) -> Option<AccessibilityMetadata> {
        resolve_in(self.0, image)
    }
}
