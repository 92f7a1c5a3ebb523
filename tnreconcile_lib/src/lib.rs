//! Library layer for tnreconcile: reconciles Tamil Nadu assembly constituency
//! names across data sources.
//!
//! Raw names are normalized to comparison keys, then resolved against a
//! canonical candidate index through exact lookup, the alias table and fuzzy
//! matching, with every result tagged by confidence tier.

pub mod alias;
pub mod batch;
pub mod config;
pub mod error;
pub mod index;
pub mod matcher;
pub mod normalize;
pub mod resolver;
pub mod sources;

pub use alias::{AliasEntry, AliasError, AliasOrigin, AliasSpec, AliasTable, AliasTableBuilder};
pub use batch::{resolve_all, resolve_all_with, BatchSummary, ResolvedRecord};
pub use config::{ConfigError, ReconcileConfig};
pub use error::ReconcileError;
pub use index::{load_canonical_csv, CanonicalColumns, CanonicalRow, ConstituencyIndex, IndexError};
pub use matcher::{
    best_match, Candidate, CandidatePool, Confidence, DistrictIndex, SimilarityMetric,
};
pub use normalize::{normalize, NormalizedKey, Reservation, ReservationParser};
pub use resolver::{resolve, Cutoffs, ResolutionResult, Resolver};
pub use sources::{
    parse_geojson_records, read_csv_records, read_geojson_records, SourceError, SourceRecord,
};
