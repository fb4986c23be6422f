// SPDX-License-Identifier: PMPL-1.0-or-later
//! Inline editing of image alt text and the decorative flag.
//!
//! Every call reports a structured outcome. Permission and persistence
//! failures are surfaced as errors and as a `success: false` response,
//! never swallowed.

use crate::actor::{Actor, Capability};
use crate::error::{AltbotError, Result};
use crate::metadata::Classification;
use crate::store::{ImageRecord, MetadataStore};
use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Response payload returned to the editing UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResponse {
    pub success: bool,
    pub data: EditData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditData {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
}

impl EditResponse {
    pub fn from_result(result: &Result<ImageRecord>, success_message: &str) -> Self {
        match result {
            Ok(record) => Self {
                success: true,
                data: EditData {
                    message: success_message.to_string(),
                    classification: Some(record.classification()),
                },
            },
            Err(e) => Self {
                success: false,
                data: EditData {
                    message: e.to_string(),
                    classification: None,
                },
            },
        }
    }
}

/// Permission-checked writer over a metadata store
pub struct InlineEditor<S> {
    store: S,
}

impl<S: MetadataStore> InlineEditor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace the alt text of image `id`
    pub fn update_alt_text(&self, actor: &Actor, id: u64, alt_text: &str) -> Result<ImageRecord> {
        self.authorize(actor, id)?;
        let clean = sanitize_alt_text(alt_text);
        let record = self.store.set_alt_text(id, &clean)?;
        info!(id, actor = %actor.login, classification = %record.classification(), "Alt text updated");
        Ok(record)
    }

    /// Set or clear the decorative flag of image `id`
    pub fn set_decorative(&self, actor: &Actor, id: u64, decorative: bool) -> Result<ImageRecord> {
        self.authorize(actor, id)?;
        let record = self.store.set_decorative(id, decorative)?;
        info!(id, actor = %actor.login, decorative, "Decorative flag updated");
        Ok(record)
    }

    /// [`update_alt_text`](Self::update_alt_text) wrapped in a UI response
    pub fn respond_alt_text(&self, actor: &Actor, id: u64, alt_text: &str) -> EditResponse {
        let result = self.update_alt_text(actor, id, alt_text);
        EditResponse::from_result(&result, "Alt text updated successfully.")
    }

    fn authorize(&self, actor: &Actor, id: u64) -> Result<()> {
        if actor.can(Capability::EditMedia) {
            return Ok(());
        }
        warn!(id, actor = %actor.login, "Edit denied");
        Err(AltbotError::PermissionDenied(format!(
            "{} may not edit image {}",
            actor.login, id
        )))
    }
}

/// Strip markup and collapse whitespace
pub fn sanitize_alt_text(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JsonFileStore, MemoryStore};
    use tempfile::TempDir;

    fn editor() -> InlineEditor<MemoryStore> {
        InlineEditor::new(MemoryStore::from_records([ImageRecord::new(1, "a.png")]))
    }

    #[test]
    fn test_update_alt_text() {
        let editor = editor();
        let record = editor
            .update_alt_text(&Actor::editor("ed"), 1, "  A  <b>red</b> kite\n")
            .unwrap();
        assert_eq!(record.metadata.alt_text, "A red kite");
        assert_eq!(record.classification(), Classification::NonDecorativeWithAlt);
    }

    #[test]
    fn test_permission_denied() {
        let editor = editor();
        let actor = Actor::new("author", &[Capability::EditPosts]);
        let result = editor.update_alt_text(&actor, 1, "text");
        assert!(matches!(result, Err(AltbotError::PermissionDenied(_))));
        assert_eq!(editor.store().get(1).unwrap().unwrap().metadata.alt_text, "");

        let response = editor.respond_alt_text(&actor, 1, "text");
        assert!(!response.success);
        assert!(response.data.message.contains("Permission denied"));
    }

    #[test]
    fn test_missing_image() {
        let response = editor().respond_alt_text(&Actor::editor("ed"), 42, "text");
        assert!(!response.success);
        assert_eq!(response.data.classification, None);
    }

    #[test]
    fn test_success_response_json() {
        let response = editor().respond_alt_text(&Actor::editor("ed"), 1, "A fox");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["message"], "Alt text updated successfully.");
        assert_eq!(json["data"]["classification"], "non_decorative_with_alt");
    }

    #[test]
    fn test_clearing_alt_text_reclassifies() {
        let editor = editor();
        let actor = Actor::editor("ed");
        editor.update_alt_text(&actor, 1, "Something").unwrap();
        let record = editor.update_alt_text(&actor, 1, "   ").unwrap();
        assert_eq!(record.classification(), Classification::NonDecorativeWithoutAlt);
        let record = editor.set_decorative(&actor, 1, true).unwrap();
        assert_eq!(record.classification(), Classification::Decorative);
    }

    #[test]
    fn test_persistence_failure_reported() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("store.json")).unwrap();
        store.upsert(ImageRecord::new(1, "a.png")).unwrap();
        std::fs::create_dir(store.temp_path()).unwrap();
        let editor = InlineEditor::new(store);
        let actor = Actor::editor("ed");

        // Missing record is reported before any write is attempted.
        let result = editor.update_alt_text(&actor, 2, "x");
        assert!(matches!(result, Err(AltbotError::NotFound(2))));

        let response = editor.respond_alt_text(&actor, 1, "A cat");
        assert!(!response.success);
        let record = editor.store().get(1).unwrap().unwrap();
        assert_eq!(record.metadata.alt_text, "");
        assert_eq!(record.classification(), Classification::NonDecorativeWithoutAlt);
    }
}
