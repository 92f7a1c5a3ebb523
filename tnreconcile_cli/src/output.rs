use anyhow::Result;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tnreconcile_lib::{AliasEntry, ReservationParser, ResolvedRecord};

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    /// Unknown names fall back to a table.
    pub fn parse(name: &str) -> Self {
        match name {
            "json" => Self::Json,
            "csv" => Self::Csv,
            "markdown" | "md" => Self::Markdown,
            _ => Self::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct NormalizeRow {
    #[tabled(rename = "Raw")]
    #[serde(rename = "Raw")]
    raw: String,
    #[tabled(rename = "Key")]
    #[serde(rename = "Key")]
    key: String,
    #[tabled(rename = "Reservation")]
    #[serde(rename = "Reservation")]
    reservation: String,
    #[tabled(rename = "Display Name")]
    #[serde(rename = "Display Name")]
    display_name: String,
}

#[derive(Tabled, Serialize)]
struct ResolutionRow {
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "District")]
    #[serde(rename = "District")]
    district: String,
    #[tabled(rename = "Key")]
    #[serde(rename = "Key")]
    key: String,
    #[tabled(rename = "Resolved")]
    #[serde(rename = "Resolved")]
    resolved: String,
    #[tabled(rename = "Official Name")]
    #[serde(rename = "Official Name")]
    official_name: String,
    #[tabled(rename = "Confidence")]
    #[serde(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Score")]
    #[serde(rename = "Score")]
    score: String,
}

#[derive(Tabled, Serialize)]
struct AliasRow {
    #[tabled(rename = "Scope")]
    #[serde(rename = "Scope")]
    scope: String,
    #[tabled(rename = "From")]
    #[serde(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    #[serde(rename = "To")]
    to: String,
    #[tabled(rename = "Origin")]
    #[serde(rename = "Origin")]
    origin: String,
    #[tabled(rename = "Target Known")]
    #[serde(rename = "Target Known")]
    target_known: String,
}

/// A resolved record together with the official spelling of its match.
#[derive(Serialize)]
pub struct ResolutionOutput<'a> {
    #[serde(flatten)]
    pub resolved: &'a ResolvedRecord,
    pub official_name: Option<&'a str>,
}

/// An alias entry and whether its target exists in the canonical index.
#[derive(Serialize)]
pub struct AliasOutput {
    #[serde(flatten)]
    pub entry: AliasEntry,
    pub target_known: bool,
}

// -- Row builders --

fn build_normalize_rows(names: &[String], parser: &ReservationParser) -> Vec<NormalizeRow> {
    names
        .iter()
        .map(|raw| NormalizeRow {
            raw: sanitize_csv_field(raw),
            key: tnreconcile_lib::normalize(raw).to_string(),
            reservation: parser.reservation(raw).to_string(),
            display_name: sanitize_csv_field(&parser.display_name(raw)),
        })
        .collect()
}

fn build_resolution_rows(rows: &[ResolutionOutput<'_>]) -> Vec<ResolutionRow> {
    rows.iter()
        .map(|row| {
            let record = &row.resolved.record;
            let result = &row.resolved.result;
            ResolutionRow {
                name: sanitize_csv_field(&record.name),
                district: sanitize_csv_field(record.district_or_empty()),
                key: result.query.to_string(),
                resolved: result
                    .resolved
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "-".to_string()),
                official_name: row
                    .official_name
                    .map(sanitize_csv_field)
                    .unwrap_or_else(|| "-".to_string()),
                confidence: result.confidence.to_string(),
                score: format_score(result.score),
            }
        })
        .collect()
}

fn build_alias_rows(aliases: &[AliasOutput]) -> Vec<AliasRow> {
    aliases
        .iter()
        .map(|a| AliasRow {
            scope: if a.entry.scope.is_empty() {
                "(statewide)".to_string()
            } else {
                a.entry.scope.to_string()
            },
            from: a.entry.from.to_string(),
            to: a.entry.to.to_string(),
            origin: a.entry.origin.to_string(),
            target_known: if a.target_known { "yes" } else { "NO" }.to_string(),
        })
        .collect()
}

fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

// -- Public printers --

pub fn print_normalized(
    names: &[String],
    parser: &ReservationParser,
    format: &OutputFormat,
) -> Result<()> {
    print_rows(build_normalize_rows(names, parser), format)
}

/// JSON output keeps the full resolution structure; the other formats print flat rows.
pub fn print_resolutions(rows: &[ResolutionOutput<'_>], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&rows);
            Ok(())
        }
        _ => print_rows(build_resolution_rows(rows), format),
    }
}

pub fn print_aliases(aliases: &[AliasOutput], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&aliases);
            Ok(())
        }
        _ => print_rows(build_alias_rows(aliases), format),
    }
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

/// Prefix spreadsheet formula triggers with a tab so CSV consumers treat them as text.
pub fn sanitize_csv_field(value: &str) -> String {
    match value.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("\t{}", value),
        _ => value.to_string(),
    }
}

fn format_score(score: f64) -> String {
    format!("{:.3}", score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tnreconcile_lib::{AliasOrigin, Confidence, NormalizedKey, ResolutionResult, SourceRecord};

    fn resolved(
        name: &str,
        district: Option<&str>,
        key: Option<&str>,
        confidence: Confidence,
        score: f64,
    ) -> ResolvedRecord {
        ResolvedRecord {
            record: SourceRecord {
                name: name.to_string(),
                district: district.map(str::to_string),
                number: None,
            },
            result: ResolutionResult {
                query: tnreconcile_lib::normalize(name),
                district: tnreconcile_lib::normalize(district.unwrap_or("")),
                resolved: key.map(NormalizedKey::verbatim),
                confidence,
                score,
            },
        }
    }

    // -- OutputFormat tests --

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("csv"), OutputFormat::Csv);
        assert_eq!(OutputFormat::parse("md"), OutputFormat::Markdown);
        assert_eq!(OutputFormat::parse("xml"), OutputFormat::Table);
    }

    // -- Row builder tests --

    #[test]
    fn test_build_normalize_rows() {
        let parser = ReservationParser::new().unwrap();
        let rows = build_normalize_rows(&["Ponneri (SC)".to_string()], &parser);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "PONNERI");
        assert_eq!(rows[0].reservation, "SC");
        assert_eq!(rows[0].display_name, "PONNERI");
    }

    #[test]
    fn test_build_resolution_rows_mapping() {
        let matched =
            resolved("Thalli", Some("Krishnagiri"), Some("THALLY"), Confidence::Alias, 1.0);
        let unmatched = resolved("Kolathur", None, None, Confidence::Unmatched, 0.0);
        let outputs = vec![
            ResolutionOutput {
                resolved: &matched,
                official_name: Some("THALLI"),
            },
            ResolutionOutput {
                resolved: &unmatched,
                official_name: None,
            },
        ];
        let rows = build_resolution_rows(&outputs);

        assert_eq!(rows[0].name, "Thalli");
        assert_eq!(rows[0].district, "Krishnagiri");
        assert_eq!(rows[0].key, "THALLI");
        assert_eq!(rows[0].resolved, "THALLY");
        assert_eq!(rows[0].official_name, "THALLI");
        assert_eq!(rows[0].confidence, "alias");
        assert_eq!(rows[0].score, "1.000");

        assert_eq!(rows[1].district, "");
        assert_eq!(rows[1].resolved, "-");
        // The placeholder is not user data and must not be escaped.
        assert_eq!(rows[1].official_name, "-");
        assert_eq!(rows[1].confidence, "unmatched");
    }

    #[test]
    fn test_build_alias_rows() {
        let aliases = vec![AliasOutput {
            entry: AliasEntry {
                scope: NormalizedKey::global(),
                from: NormalizedKey::verbatim("PALACODU"),
                to: NormalizedKey::verbatim("PALACODE"),
                origin: AliasOrigin::Curated,
            },
            target_known: false,
        }];
        let rows = build_alias_rows(&aliases);
        assert_eq!(rows[0].scope, "(statewide)");
        assert_eq!(rows[0].origin, "curated");
        assert_eq!(rows[0].target_known, "NO");
    }

    // -- JSON shape --

    #[test]
    fn test_resolution_json_shape() {
        let matched = resolved("Palacodu", None, Some("PALACODE"), Confidence::Alias, 1.0);
        let output = ResolutionOutput {
            resolved: &matched,
            official_name: Some("Palacode"),
        };
        let val = serde_json::to_value(&output).unwrap();
        assert_eq!(val["record"]["name"], "Palacodu");
        assert_eq!(val["result"]["resolved"], "PALACODE");
        assert_eq!(val["result"]["confidence"], "alias");
        assert_eq!(val["official_name"], "Palacode");
    }

    // -- CSV formula sanitization tests --

    #[test]
    fn test_sanitize_csv_field_equals() {
        assert_eq!(sanitize_csv_field("=SUM(A1)"), "\t=SUM(A1)");
    }

    #[test]
    fn test_sanitize_csv_field_minus() {
        assert_eq!(sanitize_csv_field("-cmd|'/C calc'!A0"), "\t-cmd|'/C calc'!A0");
    }

    #[test]
    fn test_sanitize_csv_field_normal() {
        assert_eq!(sanitize_csv_field("Palacode"), "Palacode");
        assert_eq!(sanitize_csv_field(""), "");
    }

    // -- Markdown output tests --

    #[test]
    fn test_markdown_resolution_structure() {
        let matched = resolved("Hosur", Some("Krishnagiri"), Some("HOSUR"), Confidence::Exact, 1.0);
        let rows = build_resolution_rows(&[ResolutionOutput {
            resolved: &matched,
            official_name: None,
        }]);
        let mut table = Table::new(&rows);
        table.with(Style::markdown());
        let md = table.to_string();

        assert!(md.contains('|'));
        assert!(md.contains("---"));
        assert!(md.contains("Official Name"));
        assert!(md.contains("HOSUR"));
    }
}
