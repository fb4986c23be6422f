// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report generation for alt-text findings.
//!
//! Supports multiple output formats:
//! - Text: human-readable findings grouped by severity
//! - JSON: structured findings for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use crate::finding::{FindingSet, Severity};
use crate::library::{ClassificationCounts, Page};
use crate::metadata::Classification;
use crate::store::ImageRecord;
use serde::Serialize;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI integration
    Sarif,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Sarif => write!(f, "sarif"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "sarif" => Ok(OutputFormat::Sarif),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Generate a report from findings
pub fn generate_report(findings: &FindingSet, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => generate_text_report(findings),
        OutputFormat::Json => to_json(findings),
        OutputFormat::Sarif => generate_sarif_report(findings),
    }
}

fn generate_text_report(findings: &FindingSet) -> String {
    let mut output = String::new();

    output.push_str("=== Altbot Image Alt-Text Report ===\n\n");
    output.push_str(&format!(
        "Scanned {} file(s), audited {} image(s)\n\n",
        findings.files_scanned, findings.images_audited
    ));

    if findings.is_empty() {
        output.push_str("No alt-text issues found. All images are compliant.\n");
        return output;
    }

    let errors = findings.errors().len();
    output.push_str(&format!(
        "Found {} issue(s): {} error(s), {} note(s)\n\n",
        findings.len(),
        errors,
        findings.len() - errors
    ));

    for severity in &[Severity::Error, Severity::Info] {
        let sev_findings = findings.by_severity(*severity);
        if sev_findings.is_empty() {
            continue;
        }

        output.push_str(&format!("--- {} ({}) ---\n", severity, sev_findings.len()));

        for finding in sev_findings {
            output.push_str(&format!("[{}] {}\n", finding.rule_id, finding.message));
            output.push_str(&format!("  Location: {}\n", finding.location_string()));

            if let Some(ref element) = finding.element {
                output.push_str(&format!("  Element: {}\n", element));
            }
            if let Some(ref criterion) = finding.wcag_criterion {
                output.push_str(&format!("  WCAG: {} (Level A)\n", criterion));
            }
            if let Some(ref suggestion) = finding.suggestion {
                output.push_str(&format!("  Fix: {}\n", suggestion));
            }

            output.push('\n');
        }
    }

    if findings.blocks_save() {
        output.push_str("RESULT: SAVE BLOCKED (images missing alt text)\n");
    } else {
        output.push_str("RESULT: PASS\n");
    }

    output
}

/// Render the dashboard counts
pub fn render_counts(counts: &ClassificationCounts, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::from("=== Media Library Accessibility ===\n\n");
            for c in Classification::ALL {
                output.push_str(&format!("{:<34} {}\n", c.label(), counts.get(c)));
            }
            output.push_str(&format!("{:<34} {}\n", "Total", counts.total()));
            output
        }
        OutputFormat::Json | OutputFormat::Sarif => to_json(counts),
    }
}

/// Render one page of the dashboard list
pub fn render_page(page: &Page<ImageRecord>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = format!(
                "Page {}/{} ({} image(s))\n\n{:>8}  {:<24}  {}\n",
                page.page,
                page.total_pages.max(1),
                page.total_items,
                "ID",
                "Classification",
                "Alt Text"
            );
            for record in &page.items {
                output.push_str(&format!(
                    "{:>8}  {:<24}  {}\n",
                    record.id,
                    record.classification().slug(),
                    record.metadata.alt_text
                ));
            }
            output
        }
        OutputFormat::Json | OutputFormat::Sarif => to_json(page),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e))
}

/// SARIF report structure (simplified)
#[derive(Debug, Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
struct SarifDriver {
    name: String,
    version: String,
    #[serde(rename = "informationUri")]
    information_uri: String,
}

#[derive(Debug, Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
    region: Option<SarifRegion>,
}

#[derive(Debug, Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Debug, Serialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
}

fn generate_sarif_report(findings: &FindingSet) -> String {
    let results: Vec<SarifResult> = findings
        .findings
        .iter()
        .map(|f| {
            let level = match f.severity {
                Severity::Error => "error",
                Severity::Info => "note",
            };

            let locations = f
                .file
                .iter()
                .map(|file| SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifactLocation {
                            uri: file.display().to_string(),
                        },
                        region: f.line.map(|l| SarifRegion { start_line: l }),
                    },
                })
                .collect();

            SarifResult {
                rule_id: f.rule_id.clone(),
                level: level.to_string(),
                message: SarifMessage { text: f.message.clone() },
                locations,
            }
        })
        .collect();

    let report = SarifReport {
        schema: "https://json.schemastore.org/sarif-2.1.0.json".to_string(),
        version: "2.1.0".to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "altbot".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    information_uri: "https://github.com/hyperpolymath/altbot".to_string(),
                },
            },
            results,
        }],
    };

    to_json(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{Finding, RULE_MISSING_ALT, RULE_UNRESOLVED};
    use std::path::PathBuf;

    fn sample_set() -> FindingSet {
        let mut findings = FindingSet::new();
        findings.add(
            Finding::new(RULE_MISSING_ALT, Severity::Error, "Missing alt text")
                .with_wcag("1.1.1")
                .with_file(PathBuf::from("post.html"))
                .with_line(10),
        );
        findings.files_scanned = 1;
        findings.images_audited = 3;
        findings
    }

    #[test]
    fn test_text_report_empty() {
        let report = generate_report(&FindingSet::new(), OutputFormat::Text);
        assert!(report.contains("No alt-text issues found"));
    }

    #[test]
    fn test_text_report_with_findings() {
        let report = generate_report(&sample_set(), OutputFormat::Text);
        assert!(report.contains(RULE_MISSING_ALT));
        assert!(report.contains("post.html:10"));
        assert!(report.contains("SAVE BLOCKED"));
    }

    #[test]
    fn test_text_report_groups_by_severity() {
        let mut findings = sample_set();
        findings.add(Finding::new(RULE_UNRESOLVED, Severity::Info, "Image not in library"));
        let report = generate_report(&findings, OutputFormat::Text);

        let errors = report.find("--- ERROR (1) ---").expect("error section");
        let notes = report.find("--- INFO (1) ---").expect("info section");
        assert!(errors < notes);
        assert!(report.contains("1 error(s), 1 note(s)"));
    }

    #[test]
    fn test_json_report() {
        let report = generate_report(&sample_set(), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&report).expect("valid JSON");
        assert!(parsed["findings"].is_array());
        assert_eq!(parsed["images_audited"], 3);
    }

    #[test]
    fn test_sarif_report() {
        let report = generate_report(&sample_set(), OutputFormat::Sarif);
        let parsed: serde_json::Value = serde_json::from_str(&report).expect("valid JSON");
        assert_eq!(parsed["version"], "2.1.0");
        assert_eq!(parsed["runs"][0]["results"][0]["level"], "error");
        assert_eq!(
            parsed["runs"][0]["results"][0]["locations"][0]["physicalLocation"]["region"]["startLine"],
            10
        );
    }

    #[test]
    fn test_render_counts() {
        let counts = ClassificationCounts { decorative: 2, with_alt: 5, without_alt: 1 };
        let text = render_counts(&counts, OutputFormat::Text);
        assert!(text.contains("Decorative"));
        assert!(text.contains("Total"));
        let json: serde_json::Value =
            serde_json::from_str(&render_counts(&counts, OutputFormat::Json)).unwrap();
        assert_eq!(json["without_alt"], 1);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("sarif".parse::<OutputFormat>().unwrap(), OutputFormat::Sarif);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
