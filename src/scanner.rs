// SPDX-License-Identifier: PMPL-1.0-or-later
//! Directory scanner for auditing content documents on disk.
//!
//! Walks directory trees, picks up content files and runs the classifier
//! against the configured metadata resolver.

use crate::classifier::{Classifier, MetadataResolver};
use crate::finding::{findings_for_audits, FindingSet};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// File extensions scanned by default
pub const DEFAULT_EXTENSIONS: &[&str] = &["html", "htm", "php"];

/// Directories to skip
const SKIP_DIRS: &[&str] = &[
    "node_modules", ".git", "target", "dist", "build", "vendor", "coverage",
];

/// Scanner bound to a classifier, a resolver and a set of extensions
pub struct Scanner<'a, R: ?Sized> {
    classifier: Classifier,
    resolver: &'a R,
    extensions: Vec<String>,
}

impl<'a, R> Scanner<'a, R>
where
    R: MetadataResolver + ?Sized,
{
    pub fn new(classifier: Classifier, resolver: &'a R) -> Self {
        Self {
            classifier,
            resolver,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = extensions.iter().map(|e| e.trim_start_matches('.').to_lowercase()).collect();
        self
    }

    /// Audit a single content document held in memory
    pub fn scan_content(&self, path: &Path, content: &str) -> FindingSet {
        let audits = self.classifier.audit(content, self.resolver);
        debug!(path = %path.display(), images = audits.len(), "Audited document");

        let mut findings = FindingSet::new();
        findings.extend(findings_for_audits(path, &audits));
        findings.files_scanned = 1;
        findings.images_audited = audits.len();
        findings
    }

    /// Audit a single file
    pub fn scan_file(&self, path: &Path) -> anyhow::Result<FindingSet> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.scan_content(path, &content))
    }

    /// Audit every content file under `dir`
    pub fn scan_directory(&self, dir: &Path) -> anyhow::Result<FindingSet> {
        let mut all = FindingSet::new();

        info!("Scanning directory: {}", dir.display());

        for entry in WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_str().unwrap_or("");
                if e.file_type().is_dir() && e.depth() > 0 {
                    return !SKIP_DIRS.contains(&name) && !name.starts_with('.');
                }
                true
            })
        {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };

            if !entry.file_type().is_file() || !self.is_content_file(entry.path()) {
                continue;
            }

            let path = entry.path();
            let content = match std::fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    info!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            let file = self.scan_content(path, &content);
            all.extend(file.findings);
            all.files_scanned += 1;
            all.images_audited += file.images_audited;
        }

        info!(
            "Scanned {} files, audited {} images, found {} issues",
            all.files_scanned,
            all.images_audited,
            all.len()
        );

        Ok(all)
    }

    fn is_content_file(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        self.extensions.iter().any(|e| *e == ext)
    }
}
