//! The `aliases` subcommand: prints the effective alias table for a canonical source.

use anyhow::Result;
use clap::Args;

use super::{build_config, build_resolver, CanonicalArgs};
use crate::output::{print_aliases, AliasOutput, OutputFormat};

#[derive(Args)]
pub struct AliasesArgs {
    #[command(flatten)]
    pub canonical: CanonicalArgs,

    /// Only print aliases whose target is missing from the canonical list
    #[arg(long)]
    pub dangling_only: bool,
}

pub fn run(args: &AliasesArgs, format: &OutputFormat) -> Result<()> {
    let config = build_config(&args.canonical, None)?;
    let resolver = build_resolver(&config, &args.canonical.canonical)?;
    let all_keys = resolver.index().all_keys();

    let dangling = resolver.aliases().dangling_targets(all_keys);
    if !dangling.is_empty() {
        tracing::warn!(
            "{} alias targets are not in the canonical list and fall back to fuzzy matching",
            dangling.len()
        );
    }

    let entries = if args.dangling_only {
        dangling
    } else {
        resolver.aliases().entries()
    };
    let rows: Vec<AliasOutput> = entries
        .into_iter()
        .map(|entry| AliasOutput {
            target_known: all_keys.contains(&entry.to),
            entry,
        })
        .collect();

    print_aliases(&rows, format)
}
