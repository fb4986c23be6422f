// SPDX-License-Identifier: PMPL-1.0-or-later
//! Altbot - Image Alt-Text Compliance Gate
//!
//! Keeps content documents from being saved while an embedded image has no
//! alternative text, unless the image is flagged decorative, and classifies
//! every media library image into one of three buckets.
//!
//! ## Components
//!
//! - **Classifier**: decorative-aware alt-text check over markup (WCAG 1.1.1)
//! - **Store**: per-image metadata (decorative flag, alt text)
//! - **Gate**: pre-save check for the classic and REST pathways
//! - **Library**: paged dashboard listing and bucket counts
//! - **Inline edit**: permission-checked metadata writes
//!
//! Components are composed explicitly by the host:
//!
//! ```rust,ignore
//! use altbot::{AltSource, MemoryStore, SaveGate, SaveRequest};
//!
//! let store = MemoryStore::new();
//! let gate = SaveGate::new(store, AltSource::Unified);
//! let decision = gate.check_rest(&SaveRequest::new(1, "<img src=\"a.png\">"));
//! ```

pub mod actor;
pub mod classifier;
pub mod config;
pub mod error;
pub mod finding;
pub mod gate;
pub mod inline_edit;
pub mod library;
pub mod metadata;
pub mod report;
pub mod scanner;
pub mod store;

pub use actor::{Actor, Capability};
pub use classifier::{
    audit_document, document_has_violation, AltSource, Classifier, ImageAudit, ImageRef,
    MetadataResolver,
};
pub use config::Config;
pub use error::{AltbotError, Result};
pub use finding::{Finding, FindingSet, Severity};
pub use gate::{Pathway, SaveDecision, SaveGate, SaveRequest};
pub use inline_edit::{EditResponse, InlineEditor};
pub use library::{ClassificationCounts, LibraryFilter, Page};
pub use metadata::{classify, is_compliant, AccessibilityMetadata, Classification};
pub use store::{ImageRecord, JsonFileStore, MemoryStore, MetadataStore, StoreResolver};
