//! Property-based tests for normalization and resolution.
//!
//! 1. Normalization is idempotent
//! 2. A pool member always resolves to itself as an exact match
//! 3. A known district never widens the candidate pool
//! 4. Similarity scores stay in 0.0..=1.0

use proptest::prelude::*;
use tnreconcile_lib::{
    normalize, resolve, AliasTable, CandidatePool, Confidence, Cutoffs, DistrictIndex,
    NormalizedKey, SimilarityMetric,
};

// ============================================================================
// Strategies
// ============================================================================

/// Constituency-like names with optional reservation and by-election noise.
fn raw_name_strategy() -> impl Strategy<Value = String> {
    (
        "[A-Za-z]{3,12}( [A-Za-z]{3,8})?",
        prop_oneof![
            Just(""),
            Just(" (SC)"),
            Just(" (ST"),
            Just(" SC"),
            Just(" : BYE ELECTION 2019"),
        ],
    )
        .prop_map(|(name, suffix)| format!("{}{}", name, suffix))
}

fn pool_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Z]{4,12}", 1..12)
}

fn metric_strategy() -> impl Strategy<Value = SimilarityMetric> {
    prop_oneof![
        Just(SimilarityMetric::Levenshtein),
        Just(SimilarityMetric::JaroWinkler),
        Just(SimilarityMetric::MatchingBlocks),
    ]
}

fn to_pool(names: &[String]) -> CandidatePool {
    names.iter().map(|n| normalize(n)).collect()
}

// ============================================================================
// Normalization
// ============================================================================

proptest! {
    #[test]
    fn test_normalize_idempotent_any_text(raw in "\\PC{0,40}") {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(once.as_str()), once);
    }

    #[test]
    fn test_normalize_idempotent_names(raw in raw_name_strategy()) {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(once.as_str()), once.clone());
        prop_assert!(!once.is_empty());
    }

    #[test]
    fn test_normalize_ignores_case(raw in "[ -~]{0,30}") {
        prop_assert_eq!(normalize(&raw.to_lowercase()), normalize(&raw.to_uppercase()));
    }
}

// ============================================================================
// Resolution
// ============================================================================

proptest! {
    #[test]
    fn test_pool_member_resolves_exactly(
        names in pool_strategy(),
        pick in any::<prop::sample::Index>(),
        metric in metric_strategy(),
    ) {
        let pool = to_pool(&names);
        let raw = pick.get(&names);
        let result = resolve(
            raw,
            "",
            &pool,
            &DistrictIndex::new(),
            &AliasTable::empty(),
            Cutoffs::default(),
            metric,
        );
        prop_assert_eq!(result.confidence, Confidence::Exact);
        prop_assert_eq!(result.resolved, Some(normalize(raw)));
    }

    #[test]
    fn test_district_never_widens(
        inside in pool_strategy(),
        outside in pool_strategy(),
        raw in "[A-Za-z]{3,12}",
        cutoff in 0.0f64..=1.0,
        metric in metric_strategy(),
    ) {
        let district_pool = to_pool(&inside);
        let mut all_keys = district_pool.clone();
        all_keys.extend(to_pool(&outside));
        let district_index: DistrictIndex =
            [(NormalizedKey::verbatim("DHARMAPURI"), district_pool.clone())].into_iter().collect();

        let result = resolve(
            &raw,
            "Dharmapuri",
            &all_keys,
            &district_index,
            &AliasTable::empty(),
            Cutoffs::uniform(cutoff),
            metric,
        );
        if let Some(key) = &result.resolved {
            prop_assert!(district_pool.contains(key));
        }
    }

    #[test]
    fn test_resolution_is_deterministic(
        names in pool_strategy(),
        raw in raw_name_strategy(),
        metric in metric_strategy(),
    ) {
        let pool = to_pool(&names);
        let run = || resolve(
            &raw,
            "",
            &pool,
            &DistrictIndex::new(),
            &AliasTable::empty(),
            Cutoffs::uniform(0.7),
            metric,
        );
        prop_assert_eq!(run(), run());
    }

    #[test]
    fn test_score_bounds(a in "[A-Z ]{0,20}", b in "[A-Z ]{0,20}", metric in metric_strategy()) {
        let score = metric.score(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score));
        if a == b {
            prop_assert_eq!(metric.score(&a, &a), 1.0);
        }
    }
}
