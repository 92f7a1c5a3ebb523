//! Readers that turn input sources into records to reconcile.
//!
//! Supports tabular CSV sources with configurable columns and GeoJSON
//! boundary files, whose feature properties use a handful of different
//! spellings for the same field.

use std::io::Read;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Missing column '{0}' in input CSV header")]
    MissingColumn(String),
    #[error("GeoJSON document has no 'features' array")]
    MissingFeatures,
}

const NAME_PROPERTIES: &[&str] = &[
    "ac_name",
    "AC_NAME",
    "name",
    "NAME",
    "constituency",
    "CONSTITUENCY",
];
const DISTRICT_PROPERTIES: &[&str] = &["dist_name", "DIST_NAME", "district", "DISTRICT"];
const NUMBER_PROPERTIES: &[&str] = &[
    "ac_no",
    "AC_NO",
    "number",
    "NUMBER",
    "constituency_no",
    "CONSTITUENCY_NO",
];

/// A name to reconcile, with whatever context the source provides.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct SourceRecord {
    pub name: String,
    pub district: Option<String>,
    pub number: Option<u32>,
}

impl SourceRecord {
    pub fn district_or_empty(&self) -> &str {
        self.district.as_deref().unwrap_or("")
    }
}

/// Read records from CSV, taking the name and (optionally) the district from
/// the named columns. Rows with an empty name are kept so callers can report them.
pub fn read_csv_records<R: Read>(
    reader: R,
    name_column: &str,
    district_column: Option<&str>,
) -> Result<Vec<SourceRecord>, SourceError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let position = |name: &str| -> Result<usize, SourceError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| SourceError::MissingColumn(name.to_string()))
    };
    let name_idx = position(name_column)?;
    let district_idx = district_column.map(position).transpose()?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let district = district_idx
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        records.push(SourceRecord {
            name: record.get(name_idx).unwrap_or("").trim().to_string(),
            district,
            number: None,
        });
    }

    Ok(records)
}

/// Parse a GeoJSON document and extract one record per named feature.
pub fn parse_geojson_records(content: &str) -> Result<Vec<SourceRecord>, SourceError> {
    let geojson: Value = serde_json::from_str(content)?;
    read_geojson_records(&geojson)
}

/// Extract one record per feature from a GeoJSON `FeatureCollection`.
///
/// Features without a usable name property are skipped.
pub fn read_geojson_records(geojson: &Value) -> Result<Vec<SourceRecord>, SourceError> {
    let features = geojson
        .get("features")
        .and_then(Value::as_array)
        .ok_or(SourceError::MissingFeatures)?;

    let mut records = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let props = feature.get("properties").unwrap_or(&Value::Null);

        let Some(name) = prop_string(props, NAME_PROPERTIES) else {
            tracing::warn!("Skipping GeoJSON feature {} without a constituency name", i);
            continue;
        };

        records.push(SourceRecord {
            name,
            district: prop_string(props, DISTRICT_PROPERTIES),
            number: prop_number(props, NUMBER_PROPERTIES),
        });
    }

    Ok(records)
}

fn prop_value<'a>(props: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| props.get(*key))
        .filter(|v| !v.is_null())
}

fn prop_string(props: &Value, keys: &[&str]) -> Option<String> {
    prop_value(props, keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn prop_number(props: &Value, keys: &[&str]) -> Option<u32> {
    match prop_value(props, keys)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
