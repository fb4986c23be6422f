// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessibility metadata and the three-way image classification.
//!
//! An image is compliant when it is flagged decorative or carries non-blank
//! alt text. The classification is always recomputed from those two fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-image accessibility record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityMetadata {
    /// Image conveys no information and needs no alt text
    #[serde(default, deserialize_with = "deserialize_decorative")]
    pub decorative: bool,
    /// Text alternative read by assistive technology
    #[serde(default)]
    pub alt_text: String,
}

impl AccessibilityMetadata {
    pub fn new(decorative: bool, alt_text: impl Into<String>) -> Self {
        Self { decorative, alt_text: alt_text.into() }
    }

    /// Metadata for an image flagged decorative
    pub fn decorative() -> Self {
        Self::new(true, "")
    }

    /// Metadata for an informative image with the given alt text
    pub fn with_alt(alt_text: impl Into<String>) -> Self {
        Self::new(false, alt_text)
    }

    /// Whether the alt text is non-blank after trimming
    pub fn has_alt(&self) -> bool {
        !self.alt_text.trim().is_empty()
    }
}

/// Derived compliance bucket of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Decorative,
    NonDecorativeWithAlt,
    #[serde(rename = "non_decorative_no_alt")]
    NonDecorativeWithoutAlt,
}

impl Classification {
    pub const ALL: [Classification; 3] = [
        Classification::Decorative,
        Classification::NonDecorativeWithAlt,
        Classification::NonDecorativeWithoutAlt,
    ];

    /// Stable identifier used by dashboard filters and the CLI
    pub fn slug(&self) -> &'static str {
        match self {
            Classification::Decorative => "decorative",
            Classification::NonDecorativeWithAlt => "non_decorative_with_alt",
            Classification::NonDecorativeWithoutAlt => "non_decorative_no_alt",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Decorative => "Decorative",
            Classification::NonDecorativeWithAlt => "Non-decorative with alt text",
            Classification::NonDecorativeWithoutAlt => "Non-decorative without alt text",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Classification::ALL
            .into_iter()
            .find(|c| c.slug() == wanted)
            .ok_or_else(|| format!("Unknown classification: {}", s))
    }
}

/// Classify an image from its metadata alone
pub fn classify(metadata: &AccessibilityMetadata) -> Classification {
    if metadata.decorative {
        Classification::Decorative
    } else if metadata.has_alt() {
        Classification::NonDecorativeWithAlt
    } else {
        Classification::NonDecorativeWithoutAlt
    }
}

/// Whether an image satisfies the alt-text policy
pub fn is_compliant(metadata: &AccessibilityMetadata) -> bool {
    classify(metadata) != Classification::NonDecorativeWithoutAlt
}

/// Decorative flag as legacy stores wrote it: absent, `"0"`, `"1"`, a bool
/// or a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawDecorative {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Normalize a raw decorative flag to a strict bool; unset means `false`.
pub fn normalize_decorative(raw: Option<&RawDecorative>) -> bool {
    match raw {
        None => false,
        Some(RawDecorative::Bool(b)) => *b,
        Some(RawDecorative::Int(n)) => *n != 0,
        Some(RawDecorative::Text(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
        }
    }
}

fn deserialize_decorative<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<RawDecorative>::deserialize(deserializer)?;
    Ok(normalize_decorative(raw.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decorative_ignores_alt_text() {
        assert_eq!(classify(&AccessibilityMetadata::new(true, "")), Classification::Decorative);
        assert_eq!(classify(&AccessibilityMetadata::new(true, "a cat")), Classification::Decorative);
        assert_eq!(classify(&AccessibilityMetadata::new(true, "   ")), Classification::Decorative);
    }

    #[test]
    fn test_non_decorative_buckets() {
        assert_eq!(
            classify(&AccessibilityMetadata::with_alt("cat")),
            Classification::NonDecorativeWithAlt
        );
        assert_eq!(
            classify(&AccessibilityMetadata::with_alt("")),
            Classification::NonDecorativeWithoutAlt
        );
        assert_eq!(
            classify(&AccessibilityMetadata::with_alt(" \t\n ")),
            Classification::NonDecorativeWithoutAlt
        );
    }

    #[test]
    fn test_compliance_matches_classification() {
        let cases = [
            AccessibilityMetadata::new(true, ""),
            AccessibilityMetadata::new(false, "x"),
            AccessibilityMetadata::new(false, " "),
        ];
        for m in &cases {
            assert_eq!(
                is_compliant(m),
                classify(m) != Classification::NonDecorativeWithoutAlt,
                "{:?}",
                m
            );
        }
        assert!(!is_compliant(&AccessibilityMetadata::default()));
    }

    #[test]
    fn test_slug_parse() {
        for c in Classification::ALL {
            assert_eq!(c.slug().parse::<Classification>().unwrap(), c);
        }
        assert!("unknown".parse::<Classification>().is_err());
    }

    #[test]
    fn test_normalize_decorative() {
        assert!(!normalize_decorative(None));
        assert!(!normalize_decorative(Some(&RawDecorative::Text("0".into()))));
        assert!(!normalize_decorative(Some(&RawDecorative::Text(String::new()))));
        assert!(normalize_decorative(Some(&RawDecorative::Text("1".into()))));
        assert!(normalize_decorative(Some(&RawDecorative::Int(1))));
        assert!(!normalize_decorative(Some(&RawDecorative::Int(0))));
        assert!(normalize_decorative(Some(&RawDecorative::Bool(true))));
    }

    #[test]
    fn test_deserialize_legacy_flags() {
        let m: AccessibilityMetadata =
            serde_json::from_str(r#"{"decorative": "1", "alt_text": ""}"#).unwrap();
        assert!(m.decorative);
        let m: AccessibilityMetadata =
            serde_json::from_str(r#"{"decorative": "0", "alt_text": "x"}"#).unwrap();
        assert!(!m.decorative);
        let m: AccessibilityMetadata = serde_json::from_str(r#"{"alt_text": "x"}"#).unwrap();
        assert!(!m.decorative);
        let m: AccessibilityMetadata = serde_json::from_str(r#"{"decorative": null}"#).unwrap();
        assert!(!m.decorative);
    }
}
