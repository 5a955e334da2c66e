//! Configuration management for the highlight engine

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::content::CaptureOptions;
use crate::highlights::CONTEXT_LEN;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Bytes of context captured on each side of a selection.
    pub context_len: usize,
    /// Selections shorter than this many chars are rejected.
    pub min_selection_chars: usize,
    /// Directory for the durable per-owner cache.
    pub cache_dir: PathBuf,
    /// Remote store database URL.
    pub database_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            context_len: CONTEXT_LEN,
            min_selection_chars: 2,
            cache_dir: PathBuf::from("./.subrayado"),
            database_url: "sqlite:./subrayado.db".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = EngineConfig::default();
        EngineConfig {
            context_len: env::var("HIGHLIGHT_CONTEXT_LEN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.context_len),
            min_selection_chars: env::var("HIGHLIGHT_MIN_SELECTION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_selection_chars),
            cache_dir: env::var("HIGHLIGHT_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
        }
    }

    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            context_len: self.context_len,
            min_selection_chars: self.min_selection_chars,
        }
    }
}
