//! Candidate index built from the canonical constituency source.
//!
//! One pass over the canonical rows (e.g. the 2021 candidate CSV) yields the
//! statewide candidate pool, the per-district pools, display spellings, and
//! the alias pairs implied by an "official spelling" column. Build it once per
//! batch and share it read-only.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Read;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alias::{AliasEntry, AliasError, AliasOrigin, AliasSpec, AliasTable};
use crate::matcher::{CandidatePool, DistrictIndex};
use crate::normalize::{normalize, NormalizedKey};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing column '{0}' in canonical CSV header")]
    MissingColumn(String),
}

/// Column names to read from the canonical CSV.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CanonicalColumns {
    pub constituency: String,
    pub district: Option<String>,
    pub official: Option<String>,
}

impl Default for CanonicalColumns {
    fn default() -> Self {
        Self {
            constituency: "2021_constituency".to_string(),
            district: Some("2021_district".to_string()),
            official: Some("const_off".to_string()),
        }
    }
}

/// One row of the canonical source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRow {
    pub constituency: String,
    pub district: Option<String>,
    pub official: Option<String>,
}

/// Read-only lookup structures for one reconciliation batch.
#[derive(Debug, Clone, Default)]
pub struct ConstituencyIndex {
    all_keys: CandidatePool,
    by_district: DistrictIndex,
    official_names: HashMap<NormalizedKey, String>,
    row_counts: BTreeMap<NormalizedKey, usize>,
    derived_aliases: Vec<AliasEntry>,
}

impl ConstituencyIndex {
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = CanonicalRow>,
    {
        let mut builder = IndexBuilder::default();
        for row in rows {
            builder.add_row(&row);
        }
        builder.build()
    }

    pub fn all_keys(&self) -> &CandidatePool {
        &self.all_keys
    }

    pub fn district_index(&self) -> &DistrictIndex {
        &self.by_district
    }

    pub fn district_pool(&self, district: &NormalizedKey) -> Option<&CandidatePool> {
        self.by_district.get(district)
    }

    /// Display spelling for a key: the first non-empty official spelling seen
    /// for it in the canonical source.
    pub fn official_name(&self, key: &NormalizedKey) -> Option<&str> {
        self.official_names.get(key).map(String::as_str)
    }

    /// Number of canonical rows that normalized to `key`.
    pub fn row_count(&self, key: &NormalizedKey) -> usize {
        self.row_counts.get(key).copied().unwrap_or(0)
    }

    /// Alias pairs `normalize(official) -> key`, scoped to each row's district.
    pub fn derived_aliases(&self) -> &[AliasEntry] {
        &self.derived_aliases
    }

    pub fn len(&self) -> usize {
        self.all_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_keys.is_empty()
    }

    /// Build the alias table for this index: derived pairs first, then the
    /// curated overrides on top.
    pub fn alias_table(&self, curated: &[AliasSpec]) -> Result<AliasTable, AliasError> {
        let mut builder = AliasTable::builder();
        for entry in &self.derived_aliases {
            builder.add_derived(&entry.scope, &entry.from, &entry.to)?;
        }
        builder.add_curated_all(curated)?;
        Ok(builder.build())
    }
}

/// Accumulates canonical rows into a [`ConstituencyIndex`].
#[derive(Debug, Default)]
pub struct IndexBuilder {
    all_keys: CandidatePool,
    by_district: DistrictIndex,
    official_names: HashMap<NormalizedKey, String>,
    row_counts: BTreeMap<NormalizedKey, usize>,
    derived: BTreeSet<(NormalizedKey, NormalizedKey, NormalizedKey)>,
    skipped: usize,
}

impl IndexBuilder {
    pub fn add_row(&mut self, row: &CanonicalRow) {
        let key = normalize(&row.constituency);
        if key.is_empty() {
            self.skipped += 1;
            return;
        }

        let district = row
            .district
            .as_deref()
            .map(normalize)
            .unwrap_or_default();

        self.all_keys.insert(key.clone());
        *self.row_counts.entry(key.clone()).or_insert(0) += 1;
        if !district.is_empty() {
            self.by_district
                .entry(district.clone())
                .or_default()
                .insert(key.clone());
        }

        let official = row.official.as_deref().map(str::trim).unwrap_or("");
        if official.is_empty() {
            return;
        }
        self.official_names
            .entry(key.clone())
            .or_insert_with(|| official.to_string());

        let official_key = normalize(official);
        if !official_key.is_empty() && official_key != key {
            self.derived.insert((district, official_key, key));
        }
    }

    pub fn build(self) -> ConstituencyIndex {
        if self.skipped > 0 {
            tracing::warn!(
                "Skipped {} canonical rows with an empty constituency name",
                self.skipped
            );
        }
        tracing::debug!(
            "Indexed {} constituencies across {} districts ({} derived aliases)",
            self.all_keys.len(),
            self.by_district.len(),
            self.derived.len()
        );

        let derived_aliases = self
            .derived
            .into_iter()
            .map(|(scope, from, to)| AliasEntry {
                scope,
                from,
                to,
                origin: AliasOrigin::Derived,
            })
            .collect();

        ConstituencyIndex {
            all_keys: self.all_keys,
            by_district: self.by_district,
            official_names: self.official_names,
            row_counts: self.row_counts,
            derived_aliases,
        }
    }
}

/// Read the canonical CSV and build its index.
///
/// The constituency column is required. Configured district and official
/// columns must also be present in the header.
pub fn load_canonical_csv<R: Read>(
    reader: R,
    columns: &CanonicalColumns,
) -> Result<ConstituencyIndex, IndexError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let position = |name: &str| -> Result<usize, IndexError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| IndexError::MissingColumn(name.to_string()))
    };
    let constituency_idx = position(&columns.constituency)?;
    let district_idx = columns.district.as_deref().map(position).transpose()?;
    let official_idx = columns.official.as_deref().map(position).transpose()?;

    let mut builder = IndexBuilder::default();
    for result in rdr.records() {
        let record = result?;
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::to_string);
        builder.add_row(&CanonicalRow {
            constituency: record.get(constituency_idx).unwrap_or("").to_string(),
            district: field(district_idx),
            official: field(official_idx),
        });
    }

    Ok(builder.build())
}
