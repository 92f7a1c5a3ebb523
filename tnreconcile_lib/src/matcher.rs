//! Approximate matching of a normalized key against a candidate pool.
//!
//! Matching tiers, first hit wins:
//! 1. Exact membership in the pool
//! 2. Structural reservation-suffix toggle (`"X"` <-> `"X SC"` / `"X ST"`)
//! 3. Best similarity score at or above the caller's cutoff

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::NormalizedKey;

/// Set of keys a name may resolve to. Ordered so iteration is deterministic.
pub type CandidatePool = BTreeSet<NormalizedKey>;

/// District key -> constituency keys inside that district.
pub type DistrictIndex = BTreeMap<NormalizedKey, CandidatePool>;

const RESERVATION_SUFFIXES: &[&str] = &[" SC", " ST"];

/// Error types for matcher configuration.
#[derive(Error, Debug)]
pub enum MatcherError {
    #[error(
        "Unknown similarity metric: {0} (expected matching-blocks, levenshtein or jaro-winkler)"
    )]
    UnknownMetric(String),
}

/// How much a caller should trust a resolution.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Key found verbatim in the pool.
    Exact,
    /// Resolved through an alias entry or a reservation-suffix toggle.
    Alias,
    /// Resolved through similarity scoring above the cutoff.
    Fuzzy,
    Unmatched,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Alias => write!(f, "alias"),
            Self::Fuzzy => write!(f, "fuzzy"),
            Self::Unmatched => write!(f, "unmatched"),
        }
    }
}

/// String similarity used by the fuzzy tier. All metrics score 0.0..=1.0,
/// with 1.0 meaning identical.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityMetric {
    /// Levenshtein distance normalized by the longer string's length.
    Levenshtein,
    JaroWinkler,
    /// Ratcliff/Obershelp: twice the matched-block length over the total length.
    /// The default cutoffs are calibrated against this ratio.
    #[default]
    MatchingBlocks,
}

impl SimilarityMetric {
    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            Self::Levenshtein => strsim::normalized_levenshtein(a, b),
            Self::JaroWinkler => strsim::jaro_winkler(a, b),
            Self::MatchingBlocks => matching_blocks_ratio(a, b),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Levenshtein => "levenshtein",
            Self::JaroWinkler => "jaro-winkler",
            Self::MatchingBlocks => "matching-blocks",
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityMetric {
    type Err = MatcherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "levenshtein" => Ok(Self::Levenshtein),
            "jaro-winkler" | "jarowinkler" => Ok(Self::JaroWinkler),
            "matching-blocks" | "ratcliff-obershelp" => Ok(Self::MatchingBlocks),
            _ => Err(MatcherError::UnknownMetric(s.to_string())),
        }
    }
}

/// A pool member selected by [`best_match`].
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub key: NormalizedKey,
    pub confidence: Confidence,
    pub score: f64,
}

/// Find the best pool member for `key`.
///
/// # Arguments
/// * `key` - Normalized key to look up
/// * `pool` - Candidate keys
/// * `cutoff` - Minimum similarity for the fuzzy tier (about 0.9 for a
///   statewide pool, 0.85 once the pool is narrowed to a district)
/// * `metric` - Similarity function for the fuzzy tier
///
/// # Returns
/// * `Some(Candidate)` with confidence `Exact`, `Alias` or `Fuzzy`
/// * `None` for an empty key, an empty pool, or no candidate at the cutoff
///
/// Equal scores are broken in favour of the lexicographically smaller key.
pub fn best_match(
    key: &NormalizedKey,
    pool: &CandidatePool,
    cutoff: f64,
    metric: SimilarityMetric,
) -> Option<Candidate> {
    if key.is_empty() || pool.is_empty() {
        return None;
    }

    if pool.contains(key) {
        return Some(Candidate {
            key: key.clone(),
            confidence: Confidence::Exact,
            score: 1.0,
        });
    }

    if let Some(variant) = suffix_variant(key, pool) {
        return Some(Candidate {
            key: variant,
            confidence: Confidence::Alias,
            score: 1.0,
        });
    }

    let mut best: Option<(f64, &NormalizedKey)> = None;
    for candidate in pool {
        let score = metric.score(key.as_str(), candidate.as_str());
        if score < cutoff {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_score, best_key)) => {
                score > best_score || (score == best_score && candidate < best_key)
            }
        };
        if better {
            best = Some((score, candidate));
        }
    }

    best.map(|(score, candidate)| Candidate {
        key: candidate.clone(),
        confidence: Confidence::Fuzzy,
        score,
    })
}

/// Pool member that differs from `key` only by a reservation suffix.
///
/// A key ending in `" SC"` / `" ST"` is tried without it; any other key is
/// tried with `" SC"` and then `" ST"` appended.
pub(crate) fn suffix_variant(key: &NormalizedKey, pool: &CandidatePool) -> Option<NormalizedKey> {
    let key = key.as_str();

    let stripped = RESERVATION_SUFFIXES
        .iter()
        .find_map(|suffix| key.strip_suffix(suffix));
    if let Some(stripped) = stripped {
        let trimmed = stripped.trim_end();
        return pool
            .contains(trimmed)
            .then(|| NormalizedKey::verbatim(trimmed));
    }

    RESERVATION_SUFFIXES.iter().find_map(|suffix| {
        let expanded = format!("{key}{suffix}");
        pool.contains(expanded.as_str())
            .then(|| NormalizedKey::verbatim(expanded))
    })
}

/// Ratcliff/Obershelp similarity: `2 * M / T`, where `M` is the total length
/// of the recursively found longest common blocks and `T` the combined length.
fn matching_blocks_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_len(&a, &b) as f64 / total as f64
}

fn matched_len(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matched_len(&a[..i], &b[..j]) + matched_len(&a[i + len..], &b[j + len..])
}

/// Longest common block as `(start_in_a, start_in_b, len)`; on ties the block
/// starting earliest in `a`, then earliest in `b`.
fn longest_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let len = prev[j] + 1;
                row[j + 1] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            }
        }
        prev = row;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(keys: &[&str]) -> CandidatePool {
        keys.iter().map(|k| NormalizedKey::verbatim(*k)).collect()
    }

    fn key(k: &str) -> NormalizedKey {
        NormalizedKey::verbatim(k)
    }

    #[test]
    fn test_exact_match_ignores_cutoff() {
        let pool = pool(&["PALACODE", "THALLY"]);
        let result = best_match(&key("THALLY"), &pool, 1.5, SimilarityMetric::default()).unwrap();
        assert_eq!(result.key.as_str(), "THALLY");
        assert_eq!(result.confidence, Confidence::Exact);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_suffix_appended() {
        let pool = pool(&["VANDAVASI SC"]);
        let result =
            best_match(&key("VANDAVASI"), &pool, 0.9, SimilarityMetric::default()).unwrap();
        assert_eq!(result.key.as_str(), "VANDAVASI SC");
        assert_eq!(result.confidence, Confidence::Alias);
    }

    #[test]
    fn test_suffix_st_appended() {
        let pool = pool(&["SENTHAMANGALAM ST"]);
        let result =
            best_match(&key("SENTHAMANGALAM"), &pool, 0.99, SimilarityMetric::default()).unwrap();
        assert_eq!(result.key.as_str(), "SENTHAMANGALAM ST");
        assert_eq!(result.confidence, Confidence::Alias);
    }

    #[test]
    fn test_suffix_stripped() {
        let pool = pool(&["PONNERI"]);
        let result =
            best_match(&key("PONNERI SC"), &pool, 0.99, SimilarityMetric::default()).unwrap();
        assert_eq!(result.key.as_str(), "PONNERI");
        assert_eq!(result.confidence, Confidence::Alias);
    }

    #[test]
    fn test_fuzzy_above_cutoff() {
        let pool = pool(&["SHOLINGANALLUR", "PALACODE"]);
        let result =
            best_match(&key("SHOZHINGANALLUR"), &pool, 0.85, SimilarityMetric::default()).unwrap();
        assert_eq!(result.key.as_str(), "SHOLINGANALLUR");
        assert_eq!(result.confidence, Confidence::Fuzzy);
        assert!(result.score >= 0.85 && result.score < 1.0);
    }

    #[test]
    fn test_fuzzy_below_cutoff() {
        let pool = pool(&["SHOLINGANALLUR"]);
        let result = best_match(&key("SHOZHINGANALLUR"), &pool, 0.99, SimilarityMetric::default());
        assert!(result.is_none());
    }

    #[test]
    fn test_empty_key_and_pool() {
        let full = pool(&["PALACODE"]);
        assert!(best_match(&key(""), &full, 0.0, SimilarityMetric::default()).is_none());
        let empty = CandidatePool::new();
        assert!(best_match(&key("PALACODE"), &empty, 0.0, SimilarityMetric::default()).is_none());
    }

    #[test]
    fn test_default_metric_tolerates_inserted_letters() {
        // YAKUMARI (8) + KAN (3) matched out of 11 + 13 characters
        let pool = pool(&["KANNIYAKUMARI"]);
        let result =
            best_match(&key("KANYAKUMARI"), &pool, 0.9, SimilarityMetric::default()).unwrap();
        assert_eq!(result.key.as_str(), "KANNIYAKUMARI");
        assert_eq!(result.confidence, Confidence::Fuzzy);
        assert!((result.score - 22.0 / 24.0).abs() < 1e-9);

        // Two insertions cost too much under normalized edit distance.
        let strict = best_match(&key("KANYAKUMARI"), &pool, 0.9, SimilarityMetric::Levenshtein);
        assert!(strict.is_none());
    }

    #[test]
    fn test_tie_prefers_smaller_key() {
        // "ABCD" is one substitution away from both candidates.
        let pool = pool(&["ABCX", "ABCE"]);
        let result = best_match(&key("ABCD"), &pool, 0.5, SimilarityMetric::Levenshtein).unwrap();
        assert_eq!(result.key.as_str(), "ABCE");
    }

    #[test]
    fn test_matching_blocks_ratio() {
        assert_eq!(matching_blocks_ratio("", ""), 1.0);
        assert_eq!(matching_blocks_ratio("ABC", "ABC"), 1.0);
        assert_eq!(matching_blocks_ratio("ABC", "XYZ"), 0.0);
        // INGANALLUR (10) + SHO (3) matched out of 15 + 14 characters
        let ratio = matching_blocks_ratio("SHOZHINGANALLUR", "SHOLINGANALLUR");
        assert!((ratio - 26.0 / 29.0).abs() < 1e-9);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!(
            "levenshtein".parse::<SimilarityMetric>().unwrap(),
            SimilarityMetric::Levenshtein
        );
        assert_eq!(
            "Jaro_Winkler".parse::<SimilarityMetric>().unwrap(),
            SimilarityMetric::JaroWinkler
        );
        assert_eq!(
            "matching-blocks".parse::<SimilarityMetric>().unwrap(),
            SimilarityMetric::MatchingBlocks
        );
        assert!(matches!(
            "soundex".parse::<SimilarityMetric>(),
            Err(MatcherError::UnknownMetric(_))
        ));
    }

    #[test]
    fn test_every_metric_finds_close_spelling() {
        let pool = pool(&["MADHURAVOYAL", "MADHAVARAM"]);
        for metric in [
            SimilarityMetric::Levenshtein,
            SimilarityMetric::JaroWinkler,
            SimilarityMetric::MatchingBlocks,
        ] {
            let result = best_match(&key("MADURAVOYAL"), &pool, 0.85, metric).unwrap();
            assert_eq!(result.key.as_str(), "MADHURAVOYAL", "metric {metric}");
        }
    }

    #[test]
    fn test_confidence_display() {
        assert_eq!(Confidence::Unmatched.to_string(), "unmatched");
        assert_eq!(Confidence::Fuzzy.to_string(), "fuzzy");
    }
}
