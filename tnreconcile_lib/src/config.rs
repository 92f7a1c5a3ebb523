//! Reconciliation settings.
//!
//! Layered as: built-in defaults, then an optional TOML file, then
//! `TNRECONCILE_*` environment variables. The CLI applies its own flags last.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alias::{load_alias_file, load_seed_aliases, AliasError, AliasSpec};
use crate::index::CanonicalColumns;
use crate::matcher::SimilarityMetric;
use crate::resolver::{Cutoffs, DEFAULT_DISTRICT_CUTOFF, DEFAULT_GLOBAL_CUTOFF};

pub const ENV_GLOBAL_CUTOFF: &str = "TNRECONCILE_GLOBAL_CUTOFF";
pub const ENV_DISTRICT_CUTOFF: &str = "TNRECONCILE_DISTRICT_CUTOFF";
pub const ENV_METRIC: &str = "TNRECONCILE_METRIC";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    InvalidCutoff { name: &'static str, value: f64 },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Fuzzy cutoff for the statewide pool.
    pub global_cutoff: f64,
    /// Fuzzy cutoff once the pool is narrowed to a district.
    pub district_cutoff: f64,
    pub metric: SimilarityMetric,
    /// Include the embedded statewide spelling overrides.
    pub use_seed_aliases: bool,
    /// Extra curated alias files, applied after the seed overrides.
    pub alias_files: Vec<PathBuf>,
    pub canonical_columns: CanonicalColumns,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            global_cutoff: DEFAULT_GLOBAL_CUTOFF,
            district_cutoff: DEFAULT_DISTRICT_CUTOFF,
            metric: SimilarityMetric::default(),
            use_seed_aliases: true,
            alias_files: Vec::new(),
            canonical_columns: CanonicalColumns::default(),
        }
    }
}

impl ReconcileConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Override settings from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Override settings from `lookup`. Unparsable values are logged and ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.global_cutoff = env_f64(&lookup, ENV_GLOBAL_CUTOFF, self.global_cutoff);
        self.district_cutoff = env_f64(&lookup, ENV_DISTRICT_CUTOFF, self.district_cutoff);

        if let Some(value) = lookup(ENV_METRIC) {
            match value.parse::<SimilarityMetric>() {
                Ok(metric) => self.metric = metric,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_METRIC, e),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("global_cutoff", self.global_cutoff),
            ("district_cutoff", self.district_cutoff),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidCutoff { name, value });
            }
        }
        Ok(())
    }

    pub fn cutoffs(&self) -> Cutoffs {
        Cutoffs {
            global: self.global_cutoff,
            district: self.district_cutoff,
        }
    }

    /// Seed overrides (if enabled) followed by every configured alias file.
    pub fn curated_aliases(&self) -> Result<Vec<AliasSpec>, AliasError> {
        let mut specs = if self.use_seed_aliases {
            load_seed_aliases()?
        } else {
            Vec::new()
        };
        for path in &self.alias_files {
            let loaded = load_alias_file(path)?;
            tracing::debug!("Loaded {} aliases from {}", loaded.len(), path.display());
            specs.extend(loaded);
        }
        Ok(specs)
    }
}

fn env_f64<F>(lookup: &F, key: &str, default: f64) -> f64
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => val.trim().parse::<f64>().unwrap_or_else(|_| {
            tracing::warn!("Ignoring {}={:?}: not a number", key, val);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ReconcileConfig::default();
        assert_eq!(config.global_cutoff, 0.9);
        assert_eq!(config.district_cutoff, 0.85);
        assert_eq!(config.metric, SimilarityMetric::MatchingBlocks);
        assert!(config.use_seed_aliases);
        assert_eq!(config.canonical_columns.constituency, "2021_constituency");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
global_cutoff = 0.92
district_cutoff = 0.8
metric = "levenshtein"
use_seed_aliases = false
alias_files = ["data/extra_aliases.yml"]

[canonical_columns]
constituency = "AC_NAME"
district = "DIST_NAME"
"#;
        let config = ReconcileConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.global_cutoff, 0.92);
        assert_eq!(config.district_cutoff, 0.8);
        assert_eq!(config.metric, SimilarityMetric::Levenshtein);
        assert!(!config.use_seed_aliases);
        assert_eq!(config.alias_files, vec![PathBuf::from("data/extra_aliases.yml")]);
        assert_eq!(config.canonical_columns.constituency, "AC_NAME");
        assert_eq!(config.canonical_columns.district.as_deref(), Some("DIST_NAME"));
        // Unset keys inside the table keep their defaults.
        assert_eq!(config.canonical_columns.official.as_deref(), Some("const_off"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ReconcileConfig::from_toml_str("metric = \"jaro-winkler\"\n").unwrap();
        assert_eq!(config.metric, SimilarityMetric::JaroWinkler);
        assert_eq!(config.global_cutoff, 0.9);
    }

    #[test]
    fn test_invalid_cutoff_rejected() {
        let result = ReconcileConfig::from_toml_str("district_cutoff = 1.2\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidCutoff { name: "district_cutoff", .. })
        ));
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let result = ReconcileConfig::from_toml_str("metric = \"soundex\"\n");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            (ENV_GLOBAL_CUTOFF, "0.95"),
            (ENV_DISTRICT_CUTOFF, "not-a-number"),
            (ENV_METRIC, "jaro_winkler"),
        ]);
        let mut config = ReconcileConfig::default();
        config.apply_env_from(|key| vars.get(key).cloned());

        assert_eq!(config.global_cutoff, 0.95);
        assert_eq!(config.district_cutoff, 0.85);
        assert_eq!(config.metric, SimilarityMetric::JaroWinkler);
    }

    #[test]
    fn test_cutoffs() {
        let config = ReconcileConfig {
            global_cutoff: 0.93,
            district_cutoff: 0.81,
            ..ReconcileConfig::default()
        };
        assert_eq!(
            config.cutoffs(),
            Cutoffs {
                global: 0.93,
                district: 0.81
            }
        );
    }

    #[test]
    fn test_curated_aliases_without_seed() {
        let config = ReconcileConfig {
            use_seed_aliases: false,
            ..ReconcileConfig::default()
        };
        assert!(config.curated_aliases().unwrap().is_empty());
    }

    #[test]
    fn test_curated_aliases_missing_file() {
        let config = ReconcileConfig {
            alias_files: vec![PathBuf::from("/nonexistent/aliases.yml")],
            ..ReconcileConfig::default()
        };
        assert!(matches!(config.curated_aliases(), Err(AliasError::Io { .. })));
    }
}
