//! `nexus.toml` in the data directory. Every field is optional; CLI flags
//! override what the file says.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use nexus_core::SortOption;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "nexus.toml";
pub const CORPUS_FILE: &str = "corpus.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Seconds between scheduler passes in `nexus daemon`.
    pub tick_interval_secs: u64,
    /// Radar frame loop period. Frames closer than 16 ms are throttled
    /// regardless.
    pub frame_interval_ms: u64,
    pub default_sort: SortOption,
    /// Relative paths resolve against the data directory.
    pub corpus_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            frame_interval_ms: 16,
            default_sort: SortOption::Relevance,
            corpus_path: None,
        }
    }
}

impl Config {
    /// Read `nexus.toml` from `base_dir`; defaults when absent.
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("invalid config in {}", path.display()))?;
        tracing::debug!(?config, "loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.tick_interval_secs == 0 {
            bail!("tick_interval_secs must be at least 1");
        }
        if self.frame_interval_ms == 0 {
            bail!("frame_interval_ms must be at least 1");
        }
        Ok(())
    }

    pub fn corpus_path(&self, base_dir: &Path) -> PathBuf {
        match &self.corpus_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => base_dir.join(p),
            None => base_dir.join(CORPUS_FILE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml(
            r#"
            tick_interval_secs = 5
            default_sort = "datum"
            "#,
        )
        .unwrap();
        assert_eq!(config.tick_interval_secs, 5);
        assert_eq!(config.default_sort, SortOption::Date);
        assert_eq!(config.frame_interval_ms, 16);
    }

    #[test]
    fn test_rejects_zero_interval_and_unknown_keys() {
        assert!(Config::from_toml("tick_interval_secs = 0").is_err());
        assert!(Config::from_toml("tick_secs = 3").is_err());
    }

    #[test]
    fn test_corpus_path_resolution() {
        let base = Path::new("/data");
        assert_eq!(
            Config::default().corpus_path(base),
            PathBuf::from("/data/corpus.json")
        );
        let config = Config {
            corpus_path: Some(PathBuf::from("feeds/x.json")),
            ..Config::default()
        };
        assert_eq!(config.corpus_path(base), PathBuf::from("/data/feeds/x.json"));
    }
}
