//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_RETRIEVAL__LEXICAL_WEIGHT=0.5`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub hybrid_search_enabled: bool,
    /// Share of the lexical score in the fused score; the vector side gets
    /// `1 - lexical_weight`.
    pub lexical_weight: f32,
    /// Candidate pool size is `k * candidate_multiplier` in hybrid mode.
    pub candidate_multiplier: usize,
    pub reranker_enabled: bool,
    pub default_top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            hybrid_search_enabled: true,
            lexical_weight: 0.3,
            candidate_multiplier: 3,
            reranker_enabled: true,
            default_top_k: 4,
        }
    }
}

impl RetrievalSettings {
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.lexical_weight) {
            return Err(Error::InvalidConfig(format!("retrieval.lexical_weight must be in [0, 1], got {}", self.lexical_weight)));
        }
        if self.candidate_multiplier == 0 {
            return Err(Error::InvalidConfig("retrieval.candidate_multiplier must be positive".into()));
        }
        if self.default_top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.default_top_k must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self { Self { chunk_size: 1000, chunk_overlap: 200 } }
}

impl ChunkingSettings {
    pub fn validate(&self) -> crate::Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub raw_dir: String,
    pub lancedb_dir: String,
    pub table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { raw_dir: "data/raw".into(), lancedb_dir: "data/lancedb".into(), table: "docs".into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub embedding_dir: Option<String>,
    pub reranker_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retrieval: RetrievalSettings,
    pub chunking: ChunkingSettings,
    pub data: DataSettings,
    pub models: ModelSettings,
}

impl Settings {
    pub fn validate(&self) -> crate::Result<()> {
        self.retrieval.validate()?;
        self.chunking.validate()
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            other => tracing::warn!(env = other, "unknown RUST_ENV, using config.toml only"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Self::from_figment(figment)
    }

    /// Wrap an already assembled figment, failing early on invalid settings.
    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
