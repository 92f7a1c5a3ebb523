//! Constituency name resolution.
//!
//! [`resolve`] is a pure function over precomputed indices: normalize, try the
//! alias table (district scope, then global), then fuzzy-match against the
//! district pool when the district is known, else against the statewide pool.
//! [`Resolver`] bundles the indices and settings for a batch.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::alias::AliasTable;
use crate::config::ReconcileConfig;
use crate::error::ReconcileError;
use crate::index::{load_canonical_csv, ConstituencyIndex};
use crate::matcher::{
    best_match, suffix_variant, CandidatePool, Confidence, DistrictIndex, SimilarityMetric,
};
use crate::normalize::{normalize, NormalizedKey};

pub const DEFAULT_GLOBAL_CUTOFF: f64 = 0.9;
pub const DEFAULT_DISTRICT_CUTOFF: f64 = 0.85;

/// Fuzzy-match cutoffs: strict for the statewide pool, looser once the pool
/// has been narrowed to one district.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Cutoffs {
    pub global: f64,
    pub district: f64,
}

impl Cutoffs {
    /// Same cutoff for both pools.
    pub fn uniform(cutoff: f64) -> Self {
        Self {
            global: cutoff,
            district: cutoff,
        }
    }
}

impl Default for Cutoffs {
    fn default() -> Self {
        Self {
            global: DEFAULT_GLOBAL_CUTOFF,
            district: DEFAULT_DISTRICT_CUTOFF,
        }
    }
}

/// Outcome of resolving one raw name.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    /// Normalized form of the raw name.
    pub query: NormalizedKey,
    /// Normalized district, empty when none was given.
    pub district: NormalizedKey,
    pub resolved: Option<NormalizedKey>,
    pub confidence: Confidence,
    /// 1.0 for exact and alias matches, the similarity for fuzzy ones, 0.0 when unmatched.
    pub score: f64,
}

impl ResolutionResult {
    fn unmatched(query: NormalizedKey, district: NormalizedKey) -> Self {
        Self {
            query,
            district,
            resolved: None,
            confidence: Confidence::Unmatched,
            score: 0.0,
        }
    }

    pub fn is_match(&self) -> bool {
        self.resolved.is_some()
    }
}

/// Resolve a raw constituency name to a key from the candidate pools.
///
/// # Arguments
/// * `raw` - Constituency name as found in the source
/// * `district_raw` - District name as found in the source; empty when unknown
/// * `all_keys` - Statewide candidate pool
/// * `district_index` - Per-district candidate pools
/// * `aliases` - Alias table for this batch
/// * `cutoffs` - Fuzzy cutoffs for the statewide and district pools
/// * `metric` - Similarity used by the fuzzy tier
///
/// When the district is present in `district_index`, only that district's
/// pool is searched, and an alias whose target lies outside it is ignored.
/// Empty input always resolves to `Unmatched`.
pub fn resolve(
    raw: &str,
    district_raw: &str,
    all_keys: &CandidatePool,
    district_index: &DistrictIndex,
    aliases: &AliasTable,
    cutoffs: Cutoffs,
    metric: SimilarityMetric,
) -> ResolutionResult {
    let query = normalize(raw);
    let district = normalize(district_raw);
    if query.is_empty() {
        return ResolutionResult::unmatched(query, district);
    }

    let district_pool = if district.is_empty() {
        None
    } else {
        district_index.get(&district)
    };
    let (pool, cutoff) = match district_pool {
        Some(pool) => (pool, cutoffs.district),
        None => (all_keys, cutoffs.global),
    };

    // An empty district is the global scope, so this covers both lookups.
    if let Some(target) = aliases.lookup(&query, &district) {
        let hit = if pool.contains(target) {
            Some(target.clone())
        } else {
            suffix_variant(target, pool)
        };
        if let Some(resolved) = hit {
            return ResolutionResult {
                query,
                district,
                resolved: Some(resolved),
                confidence: Confidence::Alias,
                score: 1.0,
            };
        }
        tracing::debug!(
            "Alias target '{}' for '{}' is not in the candidate pool; falling back to matching",
            target,
            query
        );
    }

    match best_match(&query, pool, cutoff, metric) {
        Some(candidate) => ResolutionResult {
            query,
            district,
            resolved: Some(candidate.key),
            confidence: candidate.confidence,
            score: candidate.score,
        },
        None => ResolutionResult::unmatched(query, district),
    }
}

/// Index, alias table and settings for one reconciliation batch.
///
/// Immutable once built, so it can be shared across threads.
#[derive(Debug, Clone)]
pub struct Resolver {
    index: ConstituencyIndex,
    aliases: AliasTable,
    cutoffs: Cutoffs,
    metric: SimilarityMetric,
}

impl Resolver {
    pub fn new(index: ConstituencyIndex, aliases: AliasTable) -> Self {
        Self {
            index,
            aliases,
            cutoffs: Cutoffs::default(),
            metric: SimilarityMetric::default(),
        }
    }

    pub fn with_cutoffs(mut self, cutoffs: Cutoffs) -> Self {
        self.cutoffs = cutoffs;
        self
    }

    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Build the index from a canonical CSV and the alias table from the
    /// configured seed and alias files.
    pub fn from_config<R: Read>(
        config: &ReconcileConfig,
        canonical: R,
    ) -> Result<Self, ReconcileError> {
        config.validate()?;
        let index = load_canonical_csv(canonical, &config.canonical_columns)?;
        let curated = config.curated_aliases()?;
        let aliases = index.alias_table(&curated)?;

        tracing::info!(
            "Loaded {} constituencies and {} aliases",
            index.len(),
            aliases.len()
        );

        Ok(Self::new(index, aliases)
            .with_cutoffs(config.cutoffs())
            .with_metric(config.metric))
    }

    pub fn resolve(&self, raw: &str, district_raw: &str) -> ResolutionResult {
        resolve(
            raw,
            district_raw,
            self.index.all_keys(),
            self.index.district_index(),
            &self.aliases,
            self.cutoffs,
            self.metric,
        )
    }

    pub fn index(&self) -> &ConstituencyIndex {
        &self.index
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn cutoffs(&self) -> Cutoffs {
        self.cutoffs
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    /// Display spelling for a result's resolved key, if the canonical source had one.
    pub fn official_name(&self, result: &ResolutionResult) -> Option<&str> {
        result
            .resolved
            .as_ref()
            .and_then(|key| self.index.official_name(key))
    }
}
