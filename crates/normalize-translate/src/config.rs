//! Translation configuration.
//!
//! Loaded from:
//! 1. Global: `$XDG_CONFIG_HOME/normalize/translate.toml` (or `~/.config/...`)
//! 2. Per-project: `.normalize/translate.toml` (overrides global, key by key)
//!
//! ```toml
//! [cache]
//! enabled = true
//! max_entries = 512
//!
//! [resolver]
//! hub = "java"
//! weights = { paradigm = 0.8, memory = 0.7, errors = 0.9 }
//!
//! [idioms]
//! threshold = 0.5
//!
//! [options]
//! generateComments = false
//! ```

use crate::resolve::CompatibilityWeights;
use normalize_language_meta::Language;
use normalize_surface_syntax::TranslationOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Preferred waypoint when no direct translation exists.
    pub hub: Language,
    pub weights: CompatibilityWeights,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            hub: Language::Java,
            weights: CompatibilityWeights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdiomConfig {
    /// Minimum compatibility for target-native idioms to be applied.
    pub threshold: f64,
}

impl Default for IdiomConfig {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    pub cache: CacheConfig,
    pub resolver: ResolverConfig,
    pub idioms: IdiomConfig,
    /// Option defaults layered under the caller's options.
    pub options: TranslationOptions,
}

impl TranslateConfig {
    /// Load configuration for the project rooted at `root`.
    pub fn load(root: &Path) -> Self {
        Self::load_from(Self::global_config_path().as_deref(), root)
    }

    /// Like [`load`](Self::load) with an explicit global file.
    pub fn load_from(global: Option<&Path>, root: &Path) -> Self {
        let project = root.join(".normalize").join("translate.toml");
        let mut merged = toml::Table::new();
        for path in global.into_iter().chain(std::iter::once(project.as_path())) {
            if let Some(table) = Self::load_table(path) {
                merge_tables(&mut merged, table);
            }
        }
        match toml::Value::Table(merged).try_into() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "invalid translate configuration, using defaults");
                Self::default()
            }
        }
    }

    /// Parse one TOML document.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("normalize").join("translate.toml"))
    }

    /// Missing files are skipped quietly; unreadable or malformed ones with
    /// a warning.
    fn load_table(path: &Path) -> Option<toml::Table> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read config");
                return None;
            }
        };
        match content.parse::<toml::Table>() {
            Ok(table) => {
                tracing::debug!(path = %path.display(), "loaded translate config");
                Some(table)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config");
                None
            }
        }
    }
}

/// Overlay `top` onto `base`; nested tables merge key by key.
fn merge_tables(base: &mut toml::Table, top: toml::Table) {
    for (key, value) in top {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
