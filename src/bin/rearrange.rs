//! Reformat legacy rayleigh coefficient tables into one record per line

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayleigh::io::{discover_coefficient_files, CoefficientReformatter, Instrument, RecordLayout, ReformattedFile};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Reformat legacy rayleigh coefficient tables", long_about = None)]
struct Cli {
    /// Directory holding the coefficient files
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Instrument whose coefficient set to reformat (abi, ami, fci)
    #[arg(long, conflicts_with_all = ["all", "discover"])]
    instrument: Option<Instrument>,

    /// Reformat the coefficient sets of every known instrument
    #[arg(long, conflicts_with = "discover")]
    all: bool,

    /// Reformat every legacy coefficient file found in the directory
    #[arg(long)]
    discover: bool,

    /// JSON record layout file ({"record_lengths": [..], "discard_lengths": [..]})
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Buffer lengths written as one record [default: 19,37]
    #[arg(long, value_delimiter = ',')]
    record_lengths: Option<Vec<usize>>,

    /// Buffer lengths dropped as header records [default: 3]
    #[arg(long, value_delimiter = ',')]
    discard_lengths: Option<Vec<usize>>,
}

fn report(files: &[ReformattedFile]) {
    for file in files {
        log::info!(
            "{} -> {}: {} records written, {} discarded",
            file.input.display(),
            file.output.display(),
            file.stats.records_written,
            file.stats.records_discarded
        );
        if file.stats.trailing_tokens > 0 {
            log::warn!(
                "{}: {} trailing tokens dropped",
                file.input.display(),
                file.stats.trailing_tokens
            );
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut layout = match &cli.layout {
        Some(path) => RecordLayout::from_file(path)
            .with_context(|| format!("Failed to load layout {}", path.display()))?,
        None => RecordLayout::default(),
    };
    if let Some(record_lengths) = cli.record_lengths {
        layout.record_lengths = record_lengths;
    }
    if let Some(discard_lengths) = cli.discard_lengths {
        layout.discard_lengths = discard_lengths;
    }
    log::debug!("Record layout: {:?}", layout);
    let reformatter = CoefficientReformatter::with_layout(layout);

    let instruments: Vec<Instrument> = match (cli.instrument, cli.all, cli.discover) {
        (Some(instrument), _, _) => vec![instrument],
        (None, true, _) => Instrument::ALL.to_vec(),
        (None, false, true) => {
            let files = discover_coefficient_files(&cli.dir)
                .with_context(|| format!("Failed to scan {}", cli.dir.display()))?;
            if files.is_empty() {
                bail!("No legacy coefficient files found in {}", cli.dir.display());
            }
            let written = reformatter.reformat_discovered(&files)?;
            report(&written);
            return Ok(());
        }
        (None, false, false) => bail!("Specify --instrument, --all or --discover"),
    };

    for instrument in instruments {
        let set = instrument.coefficient_set();
        let written = reformatter
            .reformat_set(&cli.dir, &set)
            .with_context(|| format!("Failed to reformat {} coefficients", set.instrument))?;
        report(&written);
    }

    Ok(())
}
