// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Taint configuration JSON schema (§6), read via `serde`/`serde_json`. Method and type
//! references are names, not crate-internal ids, since the config file is authored externally;
//! `TaintRules::resolve` binds names to ids once against a loaded `Program`.

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SourceRule {
    pub method: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SinkRule {
    pub method: String,
    pub param_index: usize,
}

/// `from`/`to` use parameter indices plus the distinguished sentinels `BASE = -1`/`RESULT = -2`
/// (§6, `ir::{BASE, RESULT}`).
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TransferRule {
    pub method: String,
    pub from: i32,
    pub to: i32,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct TaintConfig {
    #[serde(default)]
    pub sources: Vec<SourceRule>,
    #[serde(default)]
    pub sinks: Vec<SinkRule>,
    #[serde(default)]
    pub transfers: Vec<TransferRule>,
}

impl TaintConfig {
    /// Loads a taint configuration from a JSON file. A missing `taint-config` option is handled
    /// by the caller (§7: yields an empty, no-op configuration); this only handles the case
    /// where a path was given but reading or parsing it fails.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read taint config at {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse taint config at {}", path.display()))
    }
}
