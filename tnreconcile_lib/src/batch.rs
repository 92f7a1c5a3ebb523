//! Batch resolution over source records, with per-tier counts.

use serde::Serialize;

use crate::matcher::Confidence;
use crate::resolver::{ResolutionResult, Resolver};
use crate::sources::SourceRecord;

/// A source record paired with its resolution.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResolvedRecord {
    pub record: SourceRecord,
    pub result: ResolutionResult,
}

/// Counts of resolutions by confidence tier.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub exact: usize,
    pub alias: usize,
    pub fuzzy: usize,
    pub unmatched: usize,
    /// Raw names that did not resolve, in input order.
    pub unmatched_names: Vec<String>,
}

impl BatchSummary {
    pub fn record(&mut self, raw: &str, result: &ResolutionResult) {
        match result.confidence {
            Confidence::Exact => self.exact += 1,
            Confidence::Alias => self.alias += 1,
            Confidence::Fuzzy => self.fuzzy += 1,
            Confidence::Unmatched => {
                self.unmatched += 1;
                self.unmatched_names.push(raw.to_string());
            }
        }
    }

    pub fn total(&self) -> usize {
        self.exact + self.alias + self.fuzzy + self.unmatched
    }

    pub fn matched(&self) -> usize {
        self.exact + self.alias + self.fuzzy
    }

    pub fn log(&self) {
        tracing::info!(
            "Resolved {}/{} names ({} exact, {} alias, {} fuzzy)",
            self.matched(),
            self.total(),
            self.exact,
            self.alias,
            self.fuzzy
        );
    }
}

/// Resolve every record and tally the outcome.
pub fn resolve_all(
    resolver: &Resolver,
    records: &[SourceRecord],
) -> (Vec<ResolvedRecord>, BatchSummary) {
    resolve_all_with(resolver, records, |_| {})
}

/// Like [`resolve_all`], calling `on_resolved` after each record (e.g. to
/// advance a progress bar).
pub fn resolve_all_with<F>(
    resolver: &Resolver,
    records: &[SourceRecord],
    mut on_resolved: F,
) -> (Vec<ResolvedRecord>, BatchSummary)
where
    F: FnMut(&ResolvedRecord),
{
    let mut summary = BatchSummary::default();
    let mut resolved = Vec::with_capacity(records.len());
    for record in records {
        let result = resolver.resolve(&record.name, record.district_or_empty());
        match (&result.confidence, &result.resolved) {
            (Confidence::Fuzzy, Some(key)) => {
                tracing::debug!("Fuzzy match '{}' -> '{}' ({:.3})", record.name, key, result.score)
            }
            (Confidence::Unmatched, _) => tracing::warn!(
                "No match for '{}' (district '{}')",
                record.name,
                record.district_or_empty()
            ),
            _ => {}
        }
        summary.record(&record.name, &result);
        let entry = ResolvedRecord {
            record: record.clone(),
            result,
        };
        on_resolved(&entry);
        resolved.push(entry);
    }
    (resolved, summary)
}
