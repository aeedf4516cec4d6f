//! Engine configuration, built once per process and passed to the engine.
//!
//! Loaded from TOML (`config/exposition.toml`, or `$EXPOSITION_CONFIG_PATH`).
//! Every field has a default, so a missing file or a partial file is fine.

pub mod ai;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use ai::AiConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/exposition.toml";
pub const ENV_CONFIG_PATH: &str = "EXPOSITION_CONFIG_PATH";

fn default_text_short_circuit() -> f32 {
    0.70
}
fn default_contextual_accept() -> f32 {
    0.50
}
fn default_max_photos() -> usize {
    5
}

/// Thresholds driving the fallback cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Text confidence at or above which the text verdict is returned directly.
    #[serde(default = "default_text_short_circuit")]
    pub text_short_circuit: f32,
    /// Neighborhood confidence strictly above which the contextual verdict is accepted.
    #[serde(default = "default_contextual_accept")]
    pub contextual_accept: f32,
    #[serde(default = "default_max_photos")]
    pub max_photos: usize,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            text_short_circuit: default_text_short_circuit(),
            contextual_accept: default_contextual_accept(),
            max_photos: default_max_photos(),
        }
    }
}

/// Points handed to the weighted aggregator per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPoints {
    pub tier1: i32,
    pub tier2: i32,
    pub tier3: i32,
}

impl Default for TierPoints {
    fn default() -> Self {
        Self {
            tier1: 20,
            tier2: 10,
            tier3: 0,
        }
    }
}

/// One known micro-district and its typical orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodEntry {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Orientation label ("Sud-Est", "sud_ouest", ...).
    pub orientation: String,
    pub confidence: f32,
    /// Words that together suggest proximity without naming the district.
    #[serde(default)]
    pub near_tokens: Vec<String>,
    #[serde(default)]
    pub near_confidence: Option<f32>,
}

impl NeighborhoodEntry {
    fn seed(name: &str, orientation: &str, confidence: f32) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            orientation: orientation.to_string(),
            confidence,
            near_tokens: Vec::new(),
            near_confidence: None,
        }
    }
}

/// Built-in neighborhood table, used when the config file has none.
pub fn default_neighborhoods() -> Vec<NeighborhoodEntry> {
    let mut buttes = NeighborhoodEntry::seed("Buttes-Chaumont", "Sud-Est", 0.8);
    buttes.near_tokens = vec!["buttes".into(), "chaumont".into()];
    buttes.near_confidence = Some(0.7);

    let mut pyrenees = NeighborhoodEntry::seed("Pyrénées", "Sud-Ouest", 0.8);
    pyrenees.aliases = vec!["rue des Pyrénées".into()];

    vec![
        buttes,
        NeighborhoodEntry::seed("Belleville", "Sud", 0.9),
        pyrenees,
        NeighborhoodEntry::seed("Jourdain", "Sud", 0.8),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub cascade: CascadeConfig,
    #[serde(default)]
    pub points: TierPoints,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default = "default_neighborhoods")]
    pub neighborhoods: Vec<NeighborhoodEntry>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cascade: CascadeConfig::default(),
            points: TierPoints::default(),
            ai: AiConfig::default(),
            neighborhoods: default_neighborhoods(),
        }
    }
}

impl EngineConfig {
    /// Load from an explicit TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading exposition config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing exposition config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut cfg: EngineConfig = toml::from_str(content)?;
        cfg.sanitize();
        cfg.ai.resolve_api_key()?;
        Ok(cfg)
    }

    /// Load using env var + fallback:
    /// 1) $EXPOSITION_CONFIG_PATH (must exist)
    /// 2) config/exposition.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from_file(&default_path);
        }
        let mut cfg = Self::default();
        cfg.ai.resolve_api_key()?;
        Ok(cfg)
    }

    /// Keep thresholds inside `[0, 1]`; out-of-range values fall back to defaults.
    fn sanitize(&mut self) {
        if !(0.0..=1.0).contains(&self.cascade.text_short_circuit) {
            self.cascade.text_short_circuit = default_text_short_circuit();
        }
        if !(0.0..=1.0).contains(&self.cascade.contextual_accept) {
            self.cascade.contextual_accept = default_contextual_accept();
        }
        for n in &mut self.neighborhoods {
            n.confidence = n.confidence.clamp(0.0, 1.0);
            if let Some(c) = n.near_confidence.as_mut() {
                *c = c.clamp(0.0, 1.0);
            }
        }
    }
}
