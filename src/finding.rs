// SPDX-License-Identifier: PMPL-1.0-or-later
//! Findings produced when scanning content documents on disk.

use crate::classifier::{ImageAudit, ImageRef};
use crate::metadata::Classification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const RULE_MISSING_ALT: &str = "IMG-A11Y-missing-alt";
pub const RULE_UNRESOLVED: &str = "IMG-A11Y-unresolved-image";

/// Severity levels for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks the save
    Error,
    /// Informational
    Info,
}

impl Severity {
    /// Whether this severity blocks a save
    pub fn blocks_save(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// A single image-level finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: Uuid,
    /// Rule identifier (e.g., "IMG-A11Y-missing-alt")
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub message: String,
    pub file: Option<PathBuf>,
    /// Line number (1-indexed)
    pub line: Option<usize>,
    /// Offending `<img>` tag
    pub element: Option<String>,
    pub image: Option<ImageRef>,
    pub classification: Option<Classification>,
    pub suggestion: Option<String>,
    /// WCAG criterion reference
    pub wcag_criterion: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Finding {
    pub fn new(rule_id: &str, severity: Severity, message: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            rule_id: rule_id.to_string(),
            rule_name: rule_id.to_string(),
            severity,
            message: message.to_string(),
            file: None,
            line: None,
            element: None,
            image: None,
            classification: None,
            suggestion: None,
            wcag_criterion: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_rule_name(mut self, name: &str) -> Self {
        self.rule_name = name.to_string();
        self
    }

    pub fn with_file(mut self, file: PathBuf) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_element(mut self, element: &str) -> Self {
        self.element = Some(element.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    pub fn with_wcag(mut self, criterion: &str) -> Self {
        self.wcag_criterion = Some(criterion.to_string());
        self
    }

    /// Attach the audited image identity and label
    pub fn with_audit(mut self, audit: &ImageAudit) -> Self {
        self.image = audit.reference.clone();
        self.classification = Some(audit.classification);
        self.line = Some(audit.line);
        self.element = Some(audit.element.clone());
        self
    }

    /// Get location string for display
    pub fn location_string(&self) -> String {
        match (&self.file, self.line) {
            (Some(f), Some(l)) => format!("{}:{}", f.display(), l),
            (Some(f), None) => f.display().to_string(),
            _ => "<unknown>".to_string(),
        }
    }
}

/// Turn per-image audits of one file into findings
pub fn findings_for_audits(path: &Path, audits: &[ImageAudit]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for audit in audits {
        let subject = audit
            .reference
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "image without src".to_string());

        if !audit.is_compliant() {
            findings.push(
                Finding::new(
                    RULE_MISSING_ALT,
                    Severity::Error,
                    &format!("Image {} has no alt text and is not marked decorative.", subject),
                )
                .with_rule_name("Non-text Content: Missing Alt Text")
                .with_wcag("1.1.1")
                .with_file(path.to_path_buf())
                .with_audit(audit)
                .with_suggestion("Add descriptive alt text, or mark the image as decorative in the media library"),
            );
        } else if !audit.resolved {
            findings.push(
                Finding::new(
                    RULE_UNRESOLVED,
                    Severity::Info,
                    &format!("Image {} is not in the media library; judged by its markup only.", subject),
                )
                .with_rule_name("Non-text Content: Unknown Image")
                .with_wcag("1.1.1")
                .with_file(path.to_path_buf())
                .with_audit(audit),
            );
        }
    }

    findings
}

/// A collection of findings with aggregation methods
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindingSet {
    pub findings: Vec<Finding>,
    /// Number of content files examined
    #[serde(default)]
    pub files_scanned: usize,
    /// Number of images audited across those files
    #[serde(default)]
    pub images_audited: usize,
}

impl FindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.findings.extend(findings);
    }

    pub fn by_severity(&self, severity: Severity) -> Vec<&Finding> {
        self.findings.iter().filter(|f| f.severity == severity).collect()
    }

    pub fn errors(&self) -> Vec<&Finding> {
        self.by_severity(Severity::Error)
    }

    /// Whether any finding would block a save
    pub fn blocks_save(&self) -> bool {
        self.findings.iter().any(|f| f.severity.blocks_save())
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}
