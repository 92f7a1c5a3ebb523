//! The `normalize` subcommand: shows how raw names reduce to comparison keys.

use anyhow::Result;
use clap::Args;
use tnreconcile_lib::ReservationParser;

use crate::output::{print_normalized, OutputFormat};

#[derive(Args)]
pub struct NormalizeArgs {
    /// Raw constituency names
    #[arg(required = true)]
    pub names: Vec<String>,
}

pub fn run(args: &NormalizeArgs, format: &OutputFormat) -> Result<()> {
    let parser = ReservationParser::new()?;
    print_normalized(&args.names, &parser, format)
}
