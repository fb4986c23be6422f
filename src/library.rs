// SPDX-License-Identifier: PMPL-1.0-or-later
//! Media library queries for the accessibility dashboard.
//!
//! Lists image records by classification, one page at a time, and counts
//! each bucket. Classification is recomputed from the stored flags on every
//! query.

use crate::error::{AltbotError, Result};
use crate::metadata::Classification;
use crate::store::{ImageRecord, MetadataStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default page size of the dashboard list
pub const DEFAULT_PER_PAGE: usize = 36;

/// Which images a listing includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LibraryFilter {
    #[default]
    All,
    Only(Classification),
}

impl LibraryFilter {
    pub fn matches(&self, record: &ImageRecord) -> bool {
        match self {
            LibraryFilter::All => true,
            LibraryFilter::Only(c) => record.classification() == *c,
        }
    }
}

impl fmt::Display for LibraryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryFilter::All => write!(f, "all"),
            LibraryFilter::Only(c) => write!(f, "{}", c.slug()),
        }
    }
}

impl FromStr for LibraryFilter {
    type Err = AltbotError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(LibraryFilter::All);
        }
        s.parse::<Classification>()
            .map(LibraryFilter::Only)
            .map_err(AltbotError::Config)
    }
}

/// One page of a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Image count per classification bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationCounts {
    pub decorative: usize,
    pub with_alt: usize,
    pub without_alt: usize,
}

impl ClassificationCounts {
    pub fn total(&self) -> usize {
        self.decorative + self.with_alt + self.without_alt
    }

    pub fn get(&self, classification: Classification) -> usize {
        match classification {
            Classification::Decorative => self.decorative,
            Classification::NonDecorativeWithAlt => self.with_alt,
            Classification::NonDecorativeWithoutAlt => self.without_alt,
        }
    }

    fn record(&mut self, classification: Classification) {
        match classification {
            Classification::Decorative => self.decorative += 1,
            Classification::NonDecorativeWithAlt => self.with_alt += 1,
            Classification::NonDecorativeWithoutAlt => self.without_alt += 1,
        }
    }
}

/// List image records matching `filter`, ordered by id.
///
/// Page 0 is treated as page 1; a `per_page` of 0 falls back to the default.
pub fn list<S>(store: &S, filter: LibraryFilter, page: usize, per_page: usize) -> Result<Page<ImageRecord>>
where
    S: MetadataStore + ?Sized,
{
    let per_page = if per_page == 0 { DEFAULT_PER_PAGE } else { per_page };
    let page = page.max(1);

    let matching: Vec<ImageRecord> = store
        .records()?
        .into_iter()
        .filter(|r| r.is_image() && filter.matches(r))
        .collect();

    let total_items = matching.len();
    let total_pages = total_items.div_ceil(per_page);
    let items = matching
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();

    Ok(Page { items, page, per_page, total_items, total_pages })
}

/// Count image records per classification
pub fn counts<S>(store: &S) -> Result<ClassificationCounts>
where
    S: MetadataStore + ?Sized,
{
    let mut counts = ClassificationCounts::default();
    for record in store.records()?.iter().filter(|r| r.is_image()) {
        counts.record(record.classification());
    }
    Ok(counts)
}
