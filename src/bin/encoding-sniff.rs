//! encoding-sniff CLI
//!
//! Report the character encoding of files (similar to `file --mime-encoding`).

use anyhow::{Context, Result};
use clap::Parser;
use encoding_sniff::{DetectionConfig, Detector, CANDIDATES};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "encoding-sniff")]
#[command(version)]
#[command(about = "Identify the character encoding of text files")]
struct Cli {
    /// Files and directories to inspect
    #[arg(required_unless_present = "list_codecs")]
    paths: Vec<PathBuf>,

    /// Only trial-decode the first line of each file
    #[arg(long)]
    first_line: bool,

    /// Refuse files of this many megabytes or more
    #[arg(long, value_name = "MB", value_parser = parse_size_limit)]
    size: Option<f64>,

    /// Report every decode attempt
    #[arg(short, long)]
    verbose: bool,

    /// Print the candidate codecs in priority order and exit
    #[arg(long)]
    list_codecs: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.list_codecs {
        for codec in CANDIDATES {
            println!("{}", codec.name());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = DetectionConfig::default()
        .with_full_check(!cli.first_line)
        .with_verbose(cli.verbose);
    if let Some(limit) = cli.size {
        config = config.with_size_limit_mb(limit);
    }
    let detector = Detector::with_config(config);

    let single_file = cli.paths.len() == 1 && !cli.paths[0].is_dir();
    let mut failed = false;

    for input in &cli.paths {
        for path in collect_files(input) {
            match detect_file(&detector, &path) {
                Ok(codec) if single_file => println!("{}", codec),
                Ok(codec) => println!("{}: {}", path.display(), codec),
                Err(err) => {
                    eprintln!("Error: {:#}", err);
                    failed = true;
                }
            }
        }
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Parse `--size`, accepting only finite positive megabyte counts
fn parse_size_limit(value: &str) -> std::result::Result<f64, String> {
    let limit: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    if !limit.is_finite() || limit <= 0.0 {
        return Err(format!("`{value}` must be a finite number of megabytes above zero"));
    }
    Ok(limit)
}

fn detect_file(detector: &Detector, path: &Path) -> Result<String> {
    detector
        .detect_path(path)
        .with_context(|| format!("Failed to detect encoding of {}", path.display()))
}

/// Expand a directory into its regular files; other paths pass through
fn collect_files(input: &Path) -> Vec<PathBuf> {
    if !input.is_dir() {
        return vec![input.to_path_buf()];
    }

    walkdir::WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // RUST_LOG overrides the level picked from --verbose
    let default_level = if verbose { "info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_limit() {
        assert_eq!(parse_size_limit("64"), Ok(64.0));
        assert_eq!(parse_size_limit("0.5"), Ok(0.5));
    }

    #[test]
    fn test_parse_size_limit_rejects_non_positive() {
        assert!(parse_size_limit("0").is_err());
        assert!(parse_size_limit("-1").is_err());
        assert!(parse_size_limit("NaN").is_err());
        assert!(parse_size_limit("inf").is_err());
        assert!(parse_size_limit("ten").is_err());
    }

    #[test]
    fn test_cli_rejects_negative_size() {
        let err = Cli::try_parse_from(["encoding-sniff", "--size=-3", "notes.txt"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        let cli = Cli::try_parse_from(["encoding-sniff", "--size", "2.5", "notes.txt"]).unwrap();
        assert_eq!(cli.size, Some(2.5));
    }
}
