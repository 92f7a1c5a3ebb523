//! Constituency alias table.
//!
//! Maps one normalized name to another, optionally scoped to a district.
//! Entries come from two places: pairs derived from an "official spelling"
//! column in the canonical source, and curated overrides for renamed
//! constituencies and transliteration differences between sources. Curated
//! overrides are YAML configuration; the statewide defaults are embedded at
//! compile time from `seed_data/constituency_aliases.yml`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matcher::CandidatePool;
use crate::normalize::{normalize, NormalizedKey};

/// Error types for alias table construction.
#[derive(Error, Debug)]
pub enum AliasError {
    #[error("Failed to parse alias YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Failed to read alias file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Alias entry normalizes to an empty name: from '{from}' to '{to}'")]
    EmptyKey { from: String, to: String },
    #[error("Duplicate curated alias for '{from}' in scope '{scope}'")]
    DuplicateFrom { scope: String, from: String },
    #[error("Conflicting aliases for '{from}' in scope '{scope}': '{existing}' vs '{new}'")]
    Conflict {
        scope: String,
        from: String,
        existing: String,
        new: String,
    },
}

/// Top-level structure for an alias YAML file.
#[derive(Deserialize, Debug)]
pub struct AliasFile {
    pub aliases: Vec<AliasSpec>,
}

/// A curated alias as written in configuration.
///
/// `from` and `to` are raw names and are normalized on load. `district`
/// scopes the alias; without it the alias applies statewide.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AliasSpec {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub district: Option<String>,
}

/// Where an alias entry came from.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AliasOrigin {
    Derived,
    Curated,
}

impl fmt::Display for AliasOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Derived => write!(f, "derived"),
            Self::Curated => write!(f, "curated"),
        }
    }
}

/// One resolved alias; an empty `scope` means global.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AliasEntry {
    pub scope: NormalizedKey,
    pub from: NormalizedKey,
    pub to: NormalizedKey,
    pub origin: AliasOrigin,
}

type ScopedKey = (NormalizedKey, NormalizedKey);
/// `from -> (to, origin)` within one scope.
type ScopeEntries = HashMap<NormalizedKey, (NormalizedKey, AliasOrigin)>;

/// Immutable alias lookup table.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    scopes: HashMap<NormalizedKey, ScopeEntries>,
}

impl AliasTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> AliasTableBuilder {
        AliasTableBuilder::default()
    }

    /// Look up `key`, trying the district scope first and then the global scope.
    pub fn lookup(&self, key: &NormalizedKey, district: &NormalizedKey) -> Option<&NormalizedKey> {
        self.get(district, key).or_else(|| {
            if district.is_empty() {
                None
            } else {
                self.get(&NormalizedKey::global(), key)
            }
        })
    }

    fn get(&self, scope: &NormalizedKey, key: &NormalizedKey) -> Option<&NormalizedKey> {
        self.scopes
            .get(scope)
            .and_then(|entries| entries.get(key))
            .map(|(to, _)| to)
    }

    pub fn len(&self) -> usize {
        self.scopes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries sorted by scope, then source key.
    pub fn entries(&self) -> Vec<AliasEntry> {
        let mut entries: Vec<AliasEntry> = self
            .scopes
            .iter()
            .flat_map(|(scope, map)| {
                map.iter().map(move |(from, (to, origin))| AliasEntry {
                    scope: scope.clone(),
                    from: from.clone(),
                    to: to.clone(),
                    origin: *origin,
                })
            })
            .collect();
        entries.sort_by(|a, b| (&a.scope, &a.from).cmp(&(&b.scope, &b.from)));
        entries
    }

    /// Entries whose target is not a member of `pool`.
    pub fn dangling_targets(&self, pool: &CandidatePool) -> Vec<AliasEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| !pool.contains(&entry.to))
            .collect()
    }
}

/// Collects derived and curated aliases and rejects conflicts as they are added.
#[derive(Debug, Default)]
pub struct AliasTableBuilder {
    derived: BTreeMap<ScopedKey, NormalizedKey>,
    curated: BTreeMap<ScopedKey, NormalizedKey>,
}

impl AliasTableBuilder {
    /// Record an alias derived from source data.
    ///
    /// Identity pairs are ignored. The same pair may be added repeatedly, but
    /// a second, different target for the same `(scope, from)` is an error.
    pub fn add_derived(
        &mut self,
        scope: &NormalizedKey,
        from: &NormalizedKey,
        to: &NormalizedKey,
    ) -> Result<(), AliasError> {
        if from.is_empty() || to.is_empty() {
            return Err(AliasError::EmptyKey {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        if from == to {
            return Ok(());
        }

        let slot = (scope.clone(), from.clone());
        if let Some(existing) = self.derived.get(&slot) {
            if existing != to {
                return Err(AliasError::Conflict {
                    scope: scope.to_string(),
                    from: from.to_string(),
                    existing: existing.to_string(),
                    new: to.to_string(),
                });
            }
            return Ok(());
        }
        self.derived.insert(slot, to.clone());
        Ok(())
    }

    /// Record a curated override. Each `(district, from)` may appear once.
    pub fn add_curated(&mut self, spec: &AliasSpec) -> Result<(), AliasError> {
        let from = normalize(&spec.from);
        let to = normalize(&spec.to);
        if from.is_empty() || to.is_empty() {
            return Err(AliasError::EmptyKey {
                from: spec.from.clone(),
                to: spec.to.clone(),
            });
        }
        let scope = spec
            .district
            .as_deref()
            .map(normalize)
            .unwrap_or_default();

        let slot = (scope, from);
        if self.curated.contains_key(&slot) {
            return Err(AliasError::DuplicateFrom {
                scope: slot.0.to_string(),
                from: slot.1.to_string(),
            });
        }
        if slot.1 == to {
            tracing::debug!("Skipping identity alias '{}'", spec.from);
            return Ok(());
        }
        self.curated.insert(slot, to);
        Ok(())
    }

    pub fn add_curated_all(&mut self, specs: &[AliasSpec]) -> Result<(), AliasError> {
        for spec in specs {
            self.add_curated(spec)?;
        }
        Ok(())
    }

    /// Freeze the table. Curated entries overwrite derived ones for the same
    /// `(scope, from)`.
    pub fn build(self) -> AliasTable {
        let mut scopes: HashMap<NormalizedKey, ScopeEntries> = HashMap::new();

        for ((scope, from), to) in self.derived {
            scopes
                .entry(scope)
                .or_default()
                .insert(from, (to, AliasOrigin::Derived));
        }

        for ((scope, from), to) in self.curated {
            let entries = scopes.entry(scope).or_default();
            if let Some((previous, _)) = entries.get(&from) {
                if previous != &to {
                    tracing::debug!(
                        "Curated alias '{}' -> '{}' overrides derived target '{}'",
                        from,
                        to,
                        previous
                    );
                }
            }
            entries.insert(from, (to, AliasOrigin::Curated));
        }

        AliasTable { scopes }
    }
}

/// Parse curated aliases from YAML content.
pub fn parse_alias_specs(yaml_content: &str) -> Result<Vec<AliasSpec>, AliasError> {
    let file: AliasFile = serde_yml::from_str(yaml_content)?;
    Ok(file.aliases)
}

/// Read curated aliases from a YAML file on disk.
pub fn load_alias_file(path: &Path) -> Result<Vec<AliasSpec>, AliasError> {
    let content = std::fs::read_to_string(path).map_err(|source| AliasError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_alias_specs(&content)
}

/// Load the statewide GeoJSON-to-CSV spelling overrides embedded at compile time.
pub fn load_seed_aliases() -> Result<Vec<AliasSpec>, AliasError> {
    let yaml_content = include_str!("../../seed_data/constituency_aliases.yml");
    parse_alias_specs(yaml_content)
}
