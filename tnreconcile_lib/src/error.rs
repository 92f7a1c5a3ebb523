//! Error types for the library layer.

use std::fmt;

use crate::alias::AliasError;
use crate::config::ConfigError;
use crate::index::IndexError;
use crate::normalize::NormalizeError;
use crate::sources::SourceError;

/// Errors produced while preparing a reconciliation batch, wrapping the
/// per-module error types. Resolution itself never fails.
#[derive(Debug)]
pub enum ReconcileError {
    /// Settings failed to load or validate.
    Config(ConfigError),
    /// The alias table could not be built (parse failure or conflicting entries).
    Alias(AliasError),
    /// The canonical source could not be indexed.
    Index(IndexError),
    /// An input source could not be read.
    Source(SourceError),
    /// A normalization pattern failed to compile.
    Normalize(NormalizeError),
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Config error: {}", e),
            Self::Alias(e) => write!(f, "Alias error: {}", e),
            Self::Index(e) => write!(f, "Index error: {}", e),
            Self::Source(e) => write!(f, "Source error: {}", e),
            Self::Normalize(e) => write!(f, "Normalize error: {}", e),
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Alias(e) => Some(e),
            Self::Index(e) => Some(e),
            Self::Source(e) => Some(e),
            Self::Normalize(e) => Some(e),
        }
    }
}

impl From<ConfigError> for ReconcileError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<AliasError> for ReconcileError {
    fn from(e: AliasError) -> Self {
        Self::Alias(e)
    }
}

impl From<IndexError> for ReconcileError {
    fn from(e: IndexError) -> Self {
        Self::Index(e)
    }
}

impl From<SourceError> for ReconcileError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

impl From<NormalizeError> for ReconcileError {
    fn from(e: NormalizeError) -> Self {
        Self::Normalize(e)
    }
}
