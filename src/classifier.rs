// SPDX-License-Identifier: PMPL-1.0-or-later
//! Image alt-text classifier for content documents - WCAG 1.1.1 Non-text Content
//!
//! Parses a markup document, resolves every `<img>` against stored
//! accessibility metadata and decides whether the document may be saved:
//! - Decorative images never need alt text
//! - Every other image needs non-blank alt text
//! - Images the resolver does not know are treated as non-decorative
//!
//! The parser is lenient: malformed markup yields whatever images it can
//! recover and never an error.

use crate::metadata::{classify, AccessibilityMetadata, Classification};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid selector"));

/// Class token the editor stamps on inserted attachments
const ATTACHMENT_CLASS_PREFIX: &str = "wp-image-";

/// Identity of an image embedded in a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum ImageRef {
    /// Media library attachment id
    Attachment(u64),
    /// Source URL
    Url(String),
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Attachment(id) => write!(f, "attachment #{}", id),
            ImageRef::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Lookup from an embedded image to its stored metadata.
///
/// Implemented by every metadata store and by plain closures.
pub trait MetadataResolver: Send + Sync {
    fn resolve(&self, image: &ImageRef) -> Option<AccessibilityMetadata>;
}

impl<F> MetadataResolver for F
where
    F: Fn(&ImageRef) -> Option<AccessibilityMetadata> + Send + Sync,
{
    fn resolve(&self, image: &ImageRef) -> Option<AccessibilityMetadata> {
        self(image)
    }
}

/// Where the alt text of a resolved image is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AltSource {
    /// Stored metadata is canonical; markup is only consulted for images
    /// the resolver does not know
    #[default]
    Unified,
    /// Alt text always comes from the markup `alt` attribute; the
    /// decorative flag only from stored metadata
    Markup,
}

impl fmt::Display for AltSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AltSource::Unified => write!(f, "unified"),
            AltSource::Markup => write!(f, "markup"),
        }
    }
}

impl std::str::FromStr for AltSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unified" => Ok(AltSource::Unified),
            "markup" => Ok(AltSource::Markup),
            other => Err(format!("Unknown alt source: {}", other)),
        }
    }
}

/// Per-image result of auditing a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAudit {
    /// Position of the image in document order (0-based)
    pub index: usize,
    /// Estimated line of the `<img>` tag (1-based)
    pub line: usize,
    /// Identity extracted from the markup, if any
    pub reference: Option<ImageRef>,
    /// Whether the resolver knew the image
    pub resolved: bool,
    /// `alt` attribute as written in the markup
    pub markup_alt: Option<String>,
    /// Metadata the decision was based on
    pub effective: AccessibilityMetadata,
    pub classification: Classification,
    /// Reconstructed `<img>` tag
    pub element: String,
}

impl ImageAudit {
    pub fn is_compliant(&self) -> bool {
        self.classification != Classification::NonDecorativeWithoutAlt
    }
}

/// Document classifier bound to an alt-source policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    alt_source: AltSource,
}

impl Classifier {
    pub fn new(alt_source: AltSource) -> Self {
        Self { alt_source }
    }

    pub fn alt_source(&self) -> AltSource {
        self.alt_source
    }

    /// Whether any image in `document` violates the alt-text policy.
    ///
    /// Stops at the first violation.
    pub fn has_violation<R>(&self, document: &str, resolver: &R) -> bool
    where
        R: MetadataResolver + ?Sized,
    {
        if document.trim().is_empty() {
            return false;
        }

        let fragment = Html::parse_fragment(document);
        let violation = fragment.select(&IMG_SELECTOR).enumerate().find(|(idx, element)| {
            let markup = MarkupImage::from_element(element);
            let stored = markup.reference.as_ref().and_then(|r| resolver.resolve(r));
            let effective = self.effective_metadata(stored.as_ref(), &markup);
            let classification = classify(&effective);
            debug!(index = idx, reference = ?markup.reference, %classification, "Classified image");
            classification == Classification::NonDecorativeWithoutAlt
        });

        violation.is_some()
    }

    /// Classify every image in `document`, in document order
    pub fn audit<R>(&self, document: &str, resolver: &R) -> Vec<ImageAudit>
    where
        R: MetadataResolver + ?Sized,
    {
        if document.trim().is_empty() {
            return Vec::new();
        }

        let fragment = Html::parse_fragment(document);
        let lines = img_tag_lines(document);
        fragment
            .select(&IMG_SELECTOR)
            .enumerate()
            .map(|(index, element)| {
                let markup = MarkupImage::from_element(&element);
                let stored = markup.reference.as_ref().and_then(|r| resolver.resolve(r));
                let effective = self.effective_metadata(stored.as_ref(), &markup);
                let classification = classify(&effective);

                ImageAudit {
                    index,
                    line: lines.get(index).copied().unwrap_or(1),
                    resolved: stored.is_some(),
                    reference: markup.reference,
                    markup_alt: markup.alt,
                    effective,
                    classification,
                    element: element_snippet(&element),
                }
            })
            .collect()
    }

    fn effective_metadata(
        &self,
        stored: Option<&AccessibilityMetadata>,
        markup: &MarkupImage,
    ) -> AccessibilityMetadata {
        match (self.alt_source, stored) {
            (AltSource::Unified, Some(stored)) => stored.clone(),
            (AltSource::Unified, None) => AccessibilityMetadata::with_alt(markup.alt_text()),
            (AltSource::Markup, stored) => AccessibilityMetadata {
                decorative: stored.map(|m| m.decorative).unwrap_or(false),
                alt_text: markup.alt_text(),
            },
        }
    }
}

/// Whether any image in `document` violates the alt-text policy, reading
/// stored metadata as the canonical source.
pub fn document_has_violation<R>(document: &str, resolver: &R) -> bool
where
    R: MetadataResolver + ?Sized,
{
    Classifier::default().has_violation(document, resolver)
}

/// Classify every image in `document` with the default policy
pub fn audit_document<R>(document: &str, resolver: &R) -> Vec<ImageAudit>
where
    R: MetadataResolver + ?Sized,
{
    Classifier::default().audit(document, resolver)
}

/// What the markup itself says about an image. Decorative flags baked into
/// the markup are never trusted; only the resolver decides that.
struct MarkupImage {
    reference: Option<ImageRef>,
    alt: Option<String>,
}

impl MarkupImage {
    fn from_element(element: &ElementRef<'_>) -> Self {
        let el = element.value();
        Self {
            reference: image_ref(element),
            alt: el.attr("alt").map(str::to_string),
        }
    }

    fn alt_text(&self) -> String {
        self.alt.clone().unwrap_or_default()
    }
}

/// Extract the identity of an `<img>`: attachment class, then `data-id`,
/// then `src`.
pub fn image_ref(element: &ElementRef<'_>) -> Option<ImageRef> {
    let el = element.value();

    let from_class = el.attr("class").and_then(|classes| {
        classes
            .split_whitespace()
            .filter_map(|c| c.strip_prefix(ATTACHMENT_CLASS_PREFIX))
            .find_map(|id| id.parse::<u64>().ok())
    });
    if let Some(id) = from_class {
        return Some(ImageRef::Attachment(id));
    }

    if let Some(id) = el.attr("data-id").and_then(|v| v.trim().parse::<u64>().ok()) {
        return Some(ImageRef::Attachment(id));
    }

    el.attr("src")
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(|src| ImageRef::Url(src.to_string()))
}

fn element_snippet(element: &ElementRef<'_>) -> String {
    format!(
        "<img{}>",
        element
            .value()
            .attrs()
            .map(|(k, v)| format!(" {}=\"{}\"", k, v))
            .collect::<String>()
    )
}

/// Elements whose content is raw text, never markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// 1-based line of every `<img>` start tag, in document order.
///
/// Comments, raw-text element bodies and quoted attribute values are
/// skipped so that an `<img` written inside them does not shift later tags.
fn img_tag_lines(content: &str) -> Vec<usize> {
    let bytes = content.as_bytes();
    let lower = content.to_ascii_lowercase();
    let lower = lower.as_bytes();

    let mut lines = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            if bytes[i] == b'\n' {
                line += 1;
            }
            i += 1;
            continue;
        }

        if lower[i..].starts_with(b"<!--") {
            let end = find_from(lower, i + 4, b"-->").map_or(bytes.len(), |p| p + 3);
            line += count_newlines(&bytes[i..end]);
            i = end;
            continue;
        }

        let next = bytes.get(i + 1).copied().unwrap_or(b' ');
        if !(next.is_ascii_alphabetic() || matches!(next, b'/' | b'!' | b'?')) {
            // A bare `<` in text.
            i += 1;
            continue;
        }

        let name_end = (i + 1..bytes.len())
            .find(|&j| !lower[j].is_ascii_alphanumeric())
            .unwrap_or(bytes.len());
        let name = &content[i + 1..name_end];
        let tag_end = tag_end(bytes, name_end);

        if name.eq_ignore_ascii_case("img") {
            lines.push(line);
        }
        line += count_newlines(&bytes[i..tag_end]);
        i = tag_end;

        let name = name.to_ascii_lowercase();
        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            let close = format!("</{}", name);
            let end = find_from(lower, i, close.as_bytes()).unwrap_or(bytes.len());
            line += count_newlines(&bytes[i..end]);
            i = end;
        }
    }

    lines
}

/// Index just past the `>` closing a tag, honouring quoted attribute values
fn tag_end(bytes: &[u8], from: usize) -> usize {
    let mut quote: Option<u8> = None;
    let mut after_equals = false;

    for (j, &b) in bytes.iter().enumerate().skip(from) {
        match quote {
            Some(q) if b == q => {
                quote = None;
                after_equals = false;
            }
            Some(_) => {}
            None => match b {
                b'>' => return j + 1,
                b'"' | b'\'' if after_equals => quote = Some(b),
                b'=' => after_equals = true,
                b if b.is_ascii_whitespace() => {}
                _ => after_equals = false,
            },
        }
    }
    bytes.len()
}

fn find_from(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn count_newlines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_url(
        entries: &'static [(&'static str, bool, &'static str)],
    ) -> impl Fn(&ImageRef) -> Option<AccessibilityMetadata> + Send + Sync {
        move |r: &ImageRef| match r {
            ImageRef::Url(url) => entries
                .iter()
                .find(|(u, _, _)| u == url)
                .map(|(_, d, a)| AccessibilityMetadata::new(*d, *a)),
            ImageRef::Attachment(_) => None,
        }
    }

    fn nothing(_: &ImageRef) -> Option<AccessibilityMetadata> {
        None
    }

    #[test]
    fn test_empty_and_whitespace_documents() {
        assert!(!document_has_violation("", &nothing));
        assert!(!document_has_violation("   ", &nothing));
        assert!(!document_has_violation("\n\t \n", &nothing));
        assert!(audit_document("  ", &nothing).is_empty());
    }

    #[test]
    fn test_no_images() {
        let doc = "<p>Hello <strong>world</strong></p><a href=\"x\">link</a>";
        assert!(!document_has_violation(doc, &nothing));
    }

    #[test]
    fn test_alt_present() {
        let resolver = by_url(&[("a.png", false, "cat")]);
        assert!(!document_has_violation(r#"<img src="a.png" alt="cat">"#, &resolver));
    }

    #[test]
    fn test_missing_alt() {
        let resolver = by_url(&[("b.png", false, "")]);
        assert!(document_has_violation(r#"<img src="b.png">"#, &resolver));
    }

    #[test]
    fn test_decorative_overrides_missing_alt() {
        let resolver = by_url(&[("c.png", true, "")]);
        assert!(!document_has_violation(r#"<img src="c.png" alt="">"#, &resolver));
        assert!(!document_has_violation(r#"<img src="c.png">"#, &resolver));
    }

    #[test]
    fn test_second_image_violates() {
        let resolver = by_url(&[("a.png", false, "cat"), ("b.png", false, "")]);
        let doc = r#"<p><img src="a.png" alt="cat"></p><p><img src="b.png"></p>"#;
        assert!(document_has_violation(doc, &resolver));
        let reversed = r#"<p><img src="b.png"></p><p><img src="a.png" alt="cat"></p>"#;
        assert!(document_has_violation(reversed, &resolver));
    }

    #[test]
    fn test_unresolvable_without_alt() {
        assert!(document_has_violation(r#"<img src="unknown.png">"#, &nothing));
        assert!(document_has_violation(r#"<img>"#, &nothing));
        assert!(document_has_violation(r#"<img src="unknown.png" alt="  ">"#, &nothing));
    }

    #[test]
    fn test_unresolvable_with_markup_alt() {
        assert!(!document_has_violation(r#"<img src="unknown.png" alt="A dog">"#, &nothing));
    }

    #[test]
    fn test_properties_hold_for_markup_policy() {
        let markup = Classifier::new(AltSource::Markup);
        assert!(!markup.has_violation("", &nothing));
        assert!(!markup.has_violation(
            r#"<img src="a.png" alt="cat">"#,
            &by_url(&[("a.png", false, "cat")])
        ));
        assert!(markup.has_violation(r#"<img src="b.png">"#, &by_url(&[("b.png", false, "")])));
        assert!(!markup.has_violation(
            r#"<img src="c.png" alt="">"#,
            &by_url(&[("c.png", true, "")])
        ));
        assert!(markup.has_violation(r#"<img src="u.png">"#, &nothing));
    }

    #[test]
    fn test_sources_diverge() {
        // Stored alt text is set but the markup snapshot predates it.
        let resolver = by_url(&[("d.png", false, "A red door")]);
        let doc = r#"<img src="d.png">"#;
        assert!(!Classifier::new(AltSource::Unified).has_violation(doc, &resolver));
        assert!(Classifier::new(AltSource::Markup).has_violation(doc, &resolver));
    }

    #[test]
    fn test_markup_decorative_flag_ignored_for_unknown_image() {
        let doc = r#"<img src="unknown.png" data-is-decorative="1">"#;
        assert!(document_has_violation(doc, &nothing));
        assert!(Classifier::new(AltSource::Markup).has_violation(doc, &nothing));

        let with_alt = r#"<img src="unknown.png" alt="A kite" data-is-decorative="1">"#;
        assert!(!document_has_violation(with_alt, &nothing));
    }

    #[test]
    fn test_markup_flag_cannot_override_stored_flag() {
        let resolver = by_url(&[("e.png", false, "")]);
        let doc = r#"<img src="e.png" alt="" data-is-decorative="1">"#;
        assert!(Classifier::new(AltSource::Markup).has_violation(doc, &resolver));
        assert!(Classifier::new(AltSource::Unified).has_violation(doc, &resolver));

        let audits = Classifier::new(AltSource::Markup).audit(doc, &resolver);
        assert!(!audits[0].effective.decorative);
    }

    #[test]
    fn test_attachment_class_takes_precedence() {
        let resolver = |r: &ImageRef| match r {
            ImageRef::Attachment(42) => Some(AccessibilityMetadata::decorative()),
            _ => None,
        };
        let doc = r#"<figure><img src="https://example.com/x.png" class="size-large wp-image-42"></figure>"#;
        assert!(!document_has_violation(doc, &resolver));

        let audits = audit_document(doc, &resolver);
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].reference, Some(ImageRef::Attachment(42)));
        assert!(audits[0].resolved);
    }

    #[test]
    fn test_malformed_markup_is_tolerated() {
        assert!(!document_has_violation("<p><div><<<>>> </img", &nothing));
        assert!(!document_has_violation("<img src=\"a.png\" alt=\"ok\"", &nothing));
    }

    #[test]
    fn test_audit_labels_and_lines() {
        let resolver = by_url(&[("a.png", false, "cat"), ("b.png", false, ""), ("c.png", true, "")]);
        let doc = "<p>intro</p>\n<img src=\"a.png\" alt=\"cat\">\n<img src=\"b.png\">\n<img src=\"c.png\" alt=\"\">";
        let audits = audit_document(doc, &resolver);

        let labels: Vec<_> = audits.iter().map(|a| a.classification).collect();
        assert_eq!(
            labels,
            vec![
                Classification::NonDecorativeWithAlt,
                Classification::NonDecorativeWithoutAlt,
                Classification::Decorative,
            ]
        );
        assert_eq!(audits.iter().map(|a| a.line).collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(audits[1].markup_alt, None);
        assert!(!audits[1].is_compliant());
        assert_eq!(
            audits.iter().any(|a| !a.is_compliant()),
            document_has_violation(doc, &resolver)
        );
    }

    #[test]
    fn test_lines_skip_commented_and_scripted_tags() {
        let doc = "<!-- old: <img src=\"a.png\"> -->\n<p>x</p>\n<img src=\"b.png\">";
        let audits = audit_document(doc, &nothing);
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].line, 3);

        let doc = "<script>\nvar t = '<img src=x>';\n</script>\n<img src=\"c.png\">";
        assert_eq!(audit_document(doc, &nothing)[0].line, 4);

        let doc = "<a title=\"see <img> below\">x</a>\n<img\n  src=\"d.png\">\n<img src=\"e.png\">";
        let lines: Vec<usize> = audit_document(doc, &nothing).iter().map(|a| a.line).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_alt_source_parse() {
        assert_eq!("unified".parse::<AltSource>().unwrap(), AltSource::Unified);
        assert_eq!("MARKUP".parse::<AltSource>().unwrap(), AltSource::Markup);
        assert!("db".parse::<AltSource>().is_err());
    }
}
