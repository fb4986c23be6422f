// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for altbot

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AltbotError>;

#[derive(Error, Debug)]
pub enum AltbotError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Image not found: {0}")]
    NotFound(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
