//! The `resolve` subcommand: reconciles every name in a source file against
//! the canonical constituency list.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tnreconcile_lib::{
    parse_geojson_records, read_csv_records, resolve_all_with, BatchSummary, Resolver,
    ResolvedRecord, SourceRecord,
};

use super::{build_config, build_resolver, CanonicalArgs, MatchArgs};
use crate::output::{print_resolutions, OutputFormat, ResolutionOutput};

/// Arguments for the `resolve` subcommand.
///
/// Exactly one source is required: a CSV with `--input`, or a GeoJSON
/// boundary file with `--geojson`.
#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub canonical: CanonicalArgs,

    #[command(flatten)]
    pub matching: MatchArgs,

    /// CSV file with names to resolve
    #[arg(long, conflicts_with = "geojson", requires = "name_column")]
    pub input: Option<PathBuf>,

    /// Column of --input holding the constituency name
    #[arg(long)]
    pub name_column: Option<String>,

    /// Column of --input holding the district name
    #[arg(long)]
    pub district_column: Option<String>,

    /// GeoJSON FeatureCollection with constituency boundaries
    #[arg(long)]
    pub geojson: Option<PathBuf>,

    /// Only print records that did not resolve
    #[arg(long)]
    pub unmatched_only: bool,
}

pub fn run(args: &ResolveArgs, format: &OutputFormat) -> Result<()> {
    // Bad settings are reported even when the source turns out to be empty.
    let config = build_config(&args.canonical, Some(&args.matching))?;

    let records = read_source(args)?;
    if records.is_empty() {
        eprintln!("No records found in the input source.");
        return Ok(());
    }

    let resolver = build_resolver(&config, &args.canonical.canonical)?;

    let (resolved, summary) = resolve_with_progress(&resolver, &records);
    summary.log();

    let outputs: Vec<ResolutionOutput<'_>> = resolved
        .iter()
        .filter(|r| !args.unmatched_only || !r.result.is_match())
        .map(|r| ResolutionOutput {
            resolved: r,
            official_name: resolver.official_name(&r.result),
        })
        .collect();
    print_resolutions(&outputs, format)?;

    eprintln!(
        "{} records: {} exact, {} alias, {} fuzzy, {} unmatched",
        summary.total(),
        summary.exact,
        summary.alias,
        summary.fuzzy,
        summary.unmatched
    );

    Ok(())
}

fn read_source(args: &ResolveArgs) -> Result<Vec<SourceRecord>> {
    match (&args.input, &args.geojson) {
        (Some(path), None) => {
            let Some(name_column) = args.name_column.as_deref() else {
                bail!("--input requires --name-column");
            };
            let file = File::open(path)
                .with_context(|| format!("Failed to open input CSV {}", path.display()))?;
            Ok(read_csv_records(file, name_column, args.district_column.as_deref())?)
        }
        (None, Some(path)) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read GeoJSON {}", path.display()))?;
            Ok(parse_geojson_records(&content)?)
        }
        _ => bail!("Provide exactly one of --input or --geojson"),
    }
}

/// Resolve each record in order, ticking a progress bar on stderr.
fn resolve_with_progress(
    resolver: &Resolver,
    records: &[SourceRecord],
) -> (Vec<ResolvedRecord>, BatchSummary) {
    let pb = ProgressBar::new(records.len() as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
    ) {
        pb.set_style(style);
    }
    pb.set_message("resolving constituency names...");

    let batch = resolve_all_with(resolver, records, |_| pb.inc(1));
    pb.finish_with_message("done");
    batch
}
