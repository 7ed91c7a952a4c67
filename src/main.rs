// ========================================================================================
//
//                       The command-line front end: merged-lut
//
// ========================================================================================
//
// Reads the headers of several VCF files, merges either their sample columns or their
// INFO/FORMAT definitions by union, and prints the resulting index translation table:
// one row per merged entry, one column per input, `.` where an input lacks the entry.
//
// Only the header is read. Parsing stops at the `#CHROM` line.

#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]

use clap::{Parser, Subcommand};
use itertools::Itertools;
use log::{info, warn};
use merged_lut::config::{ConfigError, MergeConfig};
use merged_lut::layout::{DatasetMajor, FieldMajor};
use merged_lut::merger::{FieldMerger, MergeError};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use thiserror::Error;

/// Header lines whose `ID=` value names a per-record field.
const FIELD_LINE_PREFIXES: [&str; 2] = ["##INFO=<", "##FORMAT=<"];
/// Columns of the `#CHROM` line that precede the sample names.
const FIXED_VCF_COLUMNS: usize = 9;

// ========================================================================================
//                              Command-line interface definition
// ========================================================================================

#[derive(Parser)]
#[command(
    name = "merged-lut",
    version,
    about = "Merge VCF header entries and print the input/merged index table"
)]
struct Cli {
    /// TOML file with table sizing hints and the default log level
    #[arg(long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the sample columns of the `#CHROM` header lines
    Samples {
        #[arg(value_name = "VCF", required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Merge the IDs of the ##INFO and ##FORMAT header lines
    Fields {
        #[arg(value_name = "VCF", required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error("Failed to read '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
    #[error("'{0}' has no #CHROM header line.")]
    MissingChromLine(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Merge(#[from] MergeError),
}

#[derive(Clone, Copy)]
enum HeaderEntries {
    Samples,
    Fields,
}

// ========================================================================================
//                                 The main orchestration
// ========================================================================================

fn main() {
    let cli = Cli::parse();

    let config = match cli.config.as_deref().map(MergeConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    let (entries, inputs) = match cli.command {
        Commands::Samples { inputs } => (HeaderEntries::Samples, inputs),
        Commands::Fields { inputs } => (HeaderEntries::Fields, inputs),
    };

    if let Err(e) = run(entries, &inputs, &config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(entries: HeaderEntries, inputs: &[PathBuf], config: &MergeConfig) -> Result<(), CliError> {
    let start_time = Instant::now();

    // Rows are written merged entry by merged entry, visiting every input, so the
    // reverse table is laid out by field.
    let mut merger = FieldMerger::<DatasetMajor, FieldMajor>::from_config(inputs.len(), config);

    for (dataset, path) in inputs.iter().enumerate() {
        let names = read_header_entries(path, entries)?;
        if names.is_empty() {
            warn!("'{}' contributes no entries", path.display());
        }
        merger.add_input(dataset, &names)?;
    }

    info!(
        "Merged {} entries from {} inputs in {:.2?}",
        merger.merged_names().len(),
        inputs.len(),
        start_time.elapsed()
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_table(&mut out, &merger, inputs)?;
    out.flush()?;
    Ok(())
}

fn write_table<W: Write>(
    out: &mut W,
    merger: &FieldMerger<DatasetMajor, FieldMajor>,
    inputs: &[PathBuf],
) -> io::Result<()> {
    let header = inputs
        .iter()
        .map(|p| p.file_name().map_or_else(|| p.display().to_string(), |n| n.to_string_lossy().into_owned()))
        .join("\t");
    writeln!(out, "merged_index\tname\t{header}")?;

    for (merged, name) in merger.merged_names().iter().enumerate() {
        let locals = (0..merger.num_inputs())
            .map(|dataset| match merger.local_index(dataset, merged) {
                Some(local) => local.to_string(),
                None => ".".to_string(),
            })
            .join("\t");
        writeln!(out, "{merged}\t{name}\t{locals}")?;
    }
    Ok(())
}

// ========================================================================================
//                                   Header extraction
// ========================================================================================

fn read_header_entries(path: &Path, entries: HeaderEntries) -> Result<Vec<String>, CliError> {
    let io_err = |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(path).map_err(io_err)?);

    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(io_err)?;
        if line.starts_with("#CHROM") {
            if let HeaderEntries::Samples = entries {
                names.extend(line.split('\t').skip(FIXED_VCF_COLUMNS).map(str::to_string));
            }
            return Ok(names);
        }
        if let HeaderEntries::Fields = entries {
            if let Some(id) = field_id(&line) {
                // INFO and FORMAT may share an ID; the merged list keeps one entry.
                if !names.iter().any(|n| n == id) {
                    names.push(id.to_string());
                }
            }
        }
    }
    Err(CliError::MissingChromLine(path.to_path_buf()))
}

/// The `ID=` value of an INFO or FORMAT header line.
fn field_id(line: &str) -> Option<&str> {
    let body = FIELD_LINE_PREFIXES
        .iter()
        .find_map(|prefix| line.strip_prefix(prefix))?;
    body.trim_end_matches('>')
        .split(',')
        .find_map(|pair| pair.strip_prefix("ID="))
}
