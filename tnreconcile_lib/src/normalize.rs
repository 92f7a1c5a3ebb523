//! Constituency name normalization.
//!
//! Turns a raw name as it appears in a CSV column, a GeoJSON property or a
//! scraped page into a [`NormalizedKey`] that can be compared across sources.
//! Also parses the reservation category (SC/ST) marker and produces a
//! human-readable display name for reporting.

use std::borrow::Borrow;
use std::fmt;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Error types for normalization helpers that need compiled patterns.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("regex compile error: {0}")]
    Regex(#[from] regex::Error),
}

/// Reservation-category tokens that may trail a constituency name.
const RESERVATION_TOKENS: &[&str] = &["SC", "ST"];

/// Canonical, comparable form of a constituency or district name.
///
/// Keys are uppercase ASCII alphanumerics separated by single spaces, with
/// any trailing reservation marker and by-election annotation removed. The
/// empty key stands for "no name" and, as a district, for the global scope.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    /// The empty key, used as the global alias scope.
    pub fn global() -> Self {
        Self(String::new())
    }

    /// Wrap a string that is already in canonical form, without re-normalizing it.
    ///
    /// Useful for candidate pools whose keys deliberately keep a reservation
    /// suffix (e.g. `"VANDAVASI SC"`), which [`normalize`] would strip.
    pub fn verbatim(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NormalizedKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Normalize a raw constituency or district name.
///
/// Steps:
/// 1. Uppercase
/// 2. Split on every run of non-alphanumeric characters
/// 3. Drop a by-election annotation and everything after it
/// 4. Drop trailing `SC` / `ST` tokens (`"X SC"`, `"X (SC)"`, `"X (SC"`),
///    unless the marker is the only token left
/// 5. Join the remaining tokens with single spaces
///
/// Empty or punctuation-only input yields the empty key. The function is
/// idempotent: normalizing a key returns the same key.
pub fn normalize(raw: &str) -> NormalizedKey {
    let upper = raw.to_uppercase();
    let mut tokens: Vec<&str> = upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();

    if let Some(pos) = bye_election_start(&tokens) {
        tokens.truncate(pos);
    }

    while tokens.len() > 1
        && tokens
            .last()
            .is_some_and(|last| RESERVATION_TOKENS.contains(last))
    {
        tokens.pop();
    }

    NormalizedKey(tokens.join(" "))
}

/// Index of the first token of a `BYE ELECTION` annotation, if any.
fn bye_election_start(tokens: &[&str]) -> Option<usize> {
    tokens.iter().enumerate().find_map(|(i, token)| {
        let starts_annotation = match *token {
            "BYE" => tokens
                .get(i + 1)
                .is_some_and(|next| next.starts_with("ELECTION")),
            other => other.starts_with("BYEELECTION"),
        };
        starts_annotation.then_some(i)
    })
}

/// Seat reservation category of a constituency.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reservation {
    General,
    Sc,
    St,
}

impl fmt::Display for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => write!(f, "General"),
            Self::Sc => write!(f, "SC"),
            Self::St => write!(f, "ST"),
        }
    }
}

/// Parses reservation markers and builds display names from raw names.
///
/// Patterns are compiled once; build one parser per batch and reuse it.
pub struct ReservationParser {
    marker: Regex,
    bye_election: Regex,
}

impl ReservationParser {
    pub fn new() -> Result<Self, NormalizeError> {
        Ok(Self {
            // "(SC)", "( ST )", "(SC" or a trailing " SC" word
            marker: Regex::new(r"(?i)(?:\(\s*(SC|ST)\s*\)?|\s(SC|ST))\s*$")?,
            bye_election: Regex::new(r"(?i)[\s:(\-]*\bBYE[\s\-]*ELECTION.*$")?,
        })
    }

    /// Reservation category declared by the name's trailing marker.
    pub fn reservation(&self, raw: &str) -> Reservation {
        let without_bye = self.bye_election.replace(raw.trim(), "");
        let Some(caps) = self.marker.captures(without_bye.trim_end()) else {
            return Reservation::General;
        };
        let token = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
        match token.map(str::to_ascii_uppercase).as_deref() {
            Some("SC") => Reservation::Sc,
            Some("ST") => Reservation::St,
            _ => Reservation::General,
        }
    }

    /// Uppercased name with the reservation marker and by-election annotation
    /// removed. Punctuation and directional suffixes like `(WEST)` are kept.
    pub fn display_name(&self, raw: &str) -> String {
        let without_bye = self.bye_election.replace(raw.trim(), "");
        let cleaned = self.marker.replace(without_bye.trim_end(), "");
        let words: Vec<&str> = cleaned.split_whitespace().collect();
        words.join(" ").to_uppercase()
    }
}
