use std::io::{self, Write};
use std::path::{Path, PathBuf};

use stockdelta_core::{LookupConfig, PriceLookup, ProviderConfig, ProviderSetBuilder};

use crate::cli::{Cli, InputSource};
use crate::error::CliError;
use crate::input::{self, ParsedInput};
use crate::output;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let parsed = match cli.input_source()? {
        InputSource::File(path) => input::from_file(&path)?,
        InputSource::Stocks { names, start, end } => input::from_stocks(&names, &start, &end)?,
    };

    let config = LookupConfig::new(cli.horizon_days, cli.concurrency)?;
    let providers = ProviderSetBuilder::new(ProviderConfig::from_env()).build();
    let lookup = PriceLookup::new(&providers, config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&lookup, &parsed, &cli.output_dir(), &mut out).await?;
    Ok(())
}

/// Price the input, save the report, then print it. Nothing is printed when
/// the lookup aborts or the file cannot be written.
pub async fn execute<W: Write>(
    lookup: &PriceLookup,
    parsed: &ParsedInput,
    output_dir: &Path,
    out: &mut W,
) -> Result<PathBuf, CliError> {
    let report = lookup
        .lookup_all(&parsed.requests, parsed.start, parsed.end)
        .await?;

    let path = output::save(output_dir, &report, &parsed.requests)?;
    output::render_terminal(out, &report, &parsed.requests)?;

    writeln!(out)?;
    writeln!(out, "Results saved to: {}", path.display())?;
    Ok(path)
}
