// SPDX-License-Identifier: PMPL-1.0-or-later
//! Save gate: runs the classifier before a content document is persisted.
//!
//! Two save pathways exist and they fail differently:
//! - **classic** form saves are demoted to draft and flagged for an admin
//!   notice; autosaves, revisions and actors without edit rights pass through
//! - **rest** inserts are rejected outright with a 400 error payload
//!
//! The gate is composed explicitly with its resolver; nothing registers
//! itself globally.

use crate::actor::{Actor, Capability};
use crate::classifier::{AltSource, Classifier, MetadataResolver};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Notice key the classic pathway attaches to its redirect
pub const MISSING_ALT_NOTICE: &str = "missing_alt";

/// Error code returned by the REST pathway
pub const MISSING_ALT_CODE: &str = "missing_alt_tags";

pub const CLASSIC_MESSAGE: &str = "Save failed: Please ensure all images in the post content have alt tags or are marked as decorative for accessibility.";

pub const REST_MESSAGE: &str =
    "Save failed: Please ensure all images in the content have alt tags for accessibility.";

/// A document about to be persisted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveRequest {
    pub post_id: u64,
    pub content: String,
    #[serde(default)]
    pub autosave: bool,
    #[serde(default)]
    pub revision: bool,
}

impl SaveRequest {
    pub fn new(post_id: u64, content: impl Into<String>) -> Self {
        Self { post_id, content: content.into(), ..Default::default() }
    }

    pub fn as_autosave(mut self) -> Self {
        self.autosave = true;
        self
    }

    pub fn as_revision(mut self) -> Self {
        self.revision = true;
        self
    }
}

/// Publication status a demoted save falls back to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
}

/// Outcome of running the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum SaveDecision {
    Allow,
    /// Classic pathway: keep the content, force the status, show a notice
    Demote {
        status: PostStatus,
        notice: String,
        message: String,
    },
    /// REST pathway: refuse the insert
    Reject {
        code: String,
        message: String,
        status: u16,
    },
}

impl SaveDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, SaveDecision::Allow)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            SaveDecision::Allow => None,
            SaveDecision::Demote { message, .. } | SaveDecision::Reject { message, .. } => {
                Some(message.as_str())
            }
        }
    }
}

/// Save pathway a request arrives through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pathway {
    Classic,
    Rest,
}

impl fmt::Display for Pathway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pathway::Classic => write!(f, "classic"),
            Pathway::Rest => write!(f, "rest"),
        }
    }
}

/// Pre-commit alt-text gate
pub struct SaveGate<R> {
    resolver: R,
    classifier: Classifier,
}

impl<R: MetadataResolver> SaveGate<R> {
    pub fn new(resolver: R, alt_source: AltSource) -> Self {
        Self {
            resolver,
            classifier: Classifier::new(alt_source),
        }
    }

    pub fn check(&self, pathway: Pathway, actor: &Actor, request: &SaveRequest) -> SaveDecision {
        match pathway {
            Pathway::Classic => self.check_classic(actor, request),
            Pathway::Rest => self.check_rest(request),
        }
    }

    /// Classic form save
    pub fn check_classic(&self, actor: &Actor, request: &SaveRequest) -> SaveDecision {
        if request.autosave || request.revision {
            debug!(post_id = request.post_id, "Skipping autosave/revision");
            return SaveDecision::Allow;
        }
        if !actor.can(Capability::EditPosts) {
            debug!(post_id = request.post_id, actor = %actor.login, "Skipping save by actor without edit rights");
            return SaveDecision::Allow;
        }

        if self.classifier.has_violation(&request.content, &self.resolver) {
            warn!(post_id = request.post_id, pathway = "classic", "Save demoted: image missing alt text");
            return SaveDecision::Demote {
                status: PostStatus::Draft,
                notice: MISSING_ALT_NOTICE.to_string(),
                message: CLASSIC_MESSAGE.to_string(),
            };
        }

        SaveDecision::Allow
    }

    /// REST insert
    pub fn check_rest(&self, request: &SaveRequest) -> SaveDecision {
        if self.classifier.has_violation(&request.content, &self.resolver) {
            warn!(post_id = request.post_id, pathway = "rest", "Save rejected: image missing alt text");
            return SaveDecision::Reject {
                code: MISSING_ALT_CODE.to_string(),
                message: REST_MESSAGE.to_string(),
                status: 400,
            };
        }

        SaveDecision::Allow
    }
}
