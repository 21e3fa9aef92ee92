use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{HistoryManager, Material, MaterialRegistry};

pub const DEFAULT_CONFIG_NAME: &str = "pagecraft.config.json";

/// Pagecraft editor configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    #[serde(default)]
    pub history: HistoryConfig,

    /// Seed for node ids minted in this session
    #[serde(default = "default_id_seed")]
    pub id_seed: String,

    /// Materials registered on top of the built-in set
    #[serde(default)]
    pub materials: Vec<Material>,
}

fn default_id_seed() -> String {
    "pagecraft".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Retained actions before folding into the base snapshot (0 = unlimited)
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Quiet period for coalescing prop/style edits
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_max_size() -> usize {
    HistoryManager::DEFAULT_MAX_SIZE
}

fn default_debounce_ms() -> u64 {
    HistoryManager::DEFAULT_DEBOUNCE.as_millis() as u64
}

impl HistoryConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(EditorConfig::default())
        }
    }

    /// Built-in materials plus the configured ones
    pub fn registry(&self) -> MaterialRegistry {
        let mut registry = MaterialRegistry::builtin();
        for material in &self.materials {
            registry.register(material.clone());
        }
        registry
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            id_seed: default_id_seed(),
            materials: vec![],
        }
    }
}
