//! CLI subcommand implementations.

pub mod aliases;
pub mod normalize;
pub mod resolve;

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use tnreconcile_lib::{ReconcileConfig, Resolver, SimilarityMetric};

/// Canonical source and alias options shared by `resolve` and `aliases`.
#[derive(Args)]
pub struct CanonicalArgs {
    /// Canonical constituency CSV (e.g. the 2021 candidate list)
    #[arg(long)]
    pub canonical: PathBuf,

    /// TOML settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Extra curated alias YAML file (repeatable)
    #[arg(long = "aliases")]
    pub alias_files: Vec<PathBuf>,

    /// Skip the built-in statewide spelling overrides
    #[arg(long)]
    pub no_seed_aliases: bool,

    /// Canonical CSV column holding the constituency name
    #[arg(long)]
    pub constituency_column: Option<String>,

    /// Canonical CSV column holding the district name
    #[arg(long)]
    pub canonical_district_column: Option<String>,
}

/// Fuzzy-matching overrides.
#[derive(Args)]
pub struct MatchArgs {
    /// Fuzzy cutoff for the statewide pool (0.0-1.0)
    #[arg(long)]
    pub global_cutoff: Option<f64>,

    /// Fuzzy cutoff within a known district (0.0-1.0)
    #[arg(long)]
    pub district_cutoff: Option<f64>,

    /// Similarity metric: matching-blocks (default), levenshtein or jaro-winkler
    #[arg(long)]
    pub metric: Option<SimilarityMetric>,
}

/// Settings from the config file (if any), then the environment, then flags.
pub fn build_config(
    canonical: &CanonicalArgs,
    matching: Option<&MatchArgs>,
) -> Result<ReconcileConfig> {
    let mut config = match &canonical.config {
        Some(path) => ReconcileConfig::load(path)?,
        None => ReconcileConfig::default(),
    };
    config.apply_env();

    if canonical.no_seed_aliases {
        config.use_seed_aliases = false;
    }
    config.alias_files.extend(canonical.alias_files.iter().cloned());
    if let Some(column) = &canonical.constituency_column {
        config.canonical_columns.constituency = column.clone();
    }
    if let Some(column) = &canonical.canonical_district_column {
        config.canonical_columns.district = Some(column.clone());
    }

    if let Some(matching) = matching {
        if let Some(cutoff) = matching.global_cutoff {
            if !(0.0..=1.0).contains(&cutoff) {
                bail!("--global-cutoff must be between 0.0 and 1.0");
            }
            config.global_cutoff = cutoff;
        }
        if let Some(cutoff) = matching.district_cutoff {
            if !(0.0..=1.0).contains(&cutoff) {
                bail!("--district-cutoff must be between 0.0 and 1.0");
            }
            config.district_cutoff = cutoff;
        }
        if let Some(metric) = matching.metric {
            config.metric = metric;
        }
    }

    config.validate()?;
    Ok(config)
}

pub fn build_resolver(config: &ReconcileConfig, canonical: &Path) -> Result<Resolver> {
    let file = File::open(canonical)
        .with_context(|| format!("Failed to open canonical CSV {}", canonical.display()))?;
    Ok(Resolver::from_config(config, file)?)
}
