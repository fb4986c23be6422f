// SPDX-License-Identifier: PMPL-1.0-or-later
//! The user on whose behalf a save or an edit runs

use serde::{Deserialize, Serialize};

/// Rights an actor may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Save content documents
    EditPosts,
    /// Change media metadata (alt text, decorative flag)
    EditMedia,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub login: String,
    pub capabilities: Vec<Capability>,
}

impl Actor {
    pub fn new(login: &str, capabilities: &[Capability]) -> Self {
        Self {
            login: login.to_string(),
            capabilities: capabilities.to_vec(),
        }
    }

    /// Actor holding every capability
    pub fn editor(login: &str) -> Self {
        Self::new(login, &[Capability::EditPosts, Capability::EditMedia])
    }

    /// Actor with no capabilities
    pub fn guest(login: &str) -> Self {
        Self::new(login, &[])
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
