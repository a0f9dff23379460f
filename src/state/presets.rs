//! Experiment presets
//!
//! Named snapshots of a `SearchState`, saved and deleted by the operator and
//! persisted as JSON so they survive between sessions.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use super::{QueryLog, SearchState};
use crate::config::path_resolver;

/// A saved parameter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentPreset {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: SearchState,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

/// Collection of presets, in creation order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresetStore {
    presets: Vec<ExperimentPreset>,
}

impl PresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load presets from `path`; a missing file yields an empty store
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read presets {}: {}", path.display(), e))?;
        let presets: Vec<ExperimentPreset> = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse presets {}: {}", path.display(), e))?;
        tracing::debug!("Loaded {} presets from {}", presets.len(), path.display());
        Ok(Self { presets })
    }

    /// Persist presets to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.presets)?;
        path_resolver::write_atomic(path, &content)
    }

    /// Save a new preset; blank names are rejected
    pub fn add(
        &mut self,
        name: &str,
        description: Option<&str>,
        parameters: SearchState,
    ) -> Result<&ExperimentPreset> {
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("Preset name must not be empty"));
        }

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        self.presets.push(ExperimentPreset {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description,
            parameters,
            created_at: Utc::now(),
            last_used: None,
        });

        self.presets
            .last()
            .ok_or_else(|| anyhow!("Preset was not stored"))
    }

    /// Save a preset from the newest query-log entry's parameters
    pub fn add_from_last_query(
        &mut self,
        name: &str,
        description: Option<&str>,
        log: &QueryLog,
    ) -> Result<&ExperimentPreset> {
        let parameters = log
            .last()
            .map(|entry| entry.parameters.clone())
            .ok_or_else(|| anyhow!("No queries in this session to save as a preset"))?;
        self.add(name, description, parameters)
    }

    /// Delete a preset by id; returns whether one was removed
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.presets.len();
        self.presets.retain(|p| p.id != id);
        self.presets.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&ExperimentPreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Resolve a preset by exact id, unique id prefix, or exact name
    pub fn find(&self, key: &str) -> Option<&ExperimentPreset> {
        if let Some(preset) = self.get(key) {
            return Some(preset);
        }
        let mut by_prefix = self.presets.iter().filter(|p| p.id.starts_with(key));
        if let (Some(preset), None) = (by_prefix.next(), by_prefix.next()) {
            return Some(preset);
        }
        self.presets.iter().find(|p| p.name == key)
    }

    /// Record that a preset was loaded; returns its parameters
    pub fn mark_used(&mut self, id: &str) -> Option<SearchState> {
        let preset = self.presets.iter_mut().find(|p| p.id == id)?;
        preset.last_used = Some(Utc::now());
        Some(preset.parameters.clone())
    }

    pub fn list(&self) -> &[ExperimentPreset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
