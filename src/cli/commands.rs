//! CLI arguments

use crate::config::DEFAULT_CONFIG_PATH;
use clap::Parser;
use std::path::PathBuf;

/// Provision warehouse tables from staged CSV files and bulk-load them
#[derive(Parser, Debug)]
#[command(name = "stage-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Directory for generated `<TABLE>.sql` artifacts (overrides the config)
    #[arg(long)]
    pub artifact_dir: Option<PathBuf>,

    /// Files processed at once (overrides the config)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Generate statements and artifacts without executing them
    #[arg(long)]
    pub dry_run: bool,

    /// Summary format
    #[arg(short, long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON summary on one line
    Json,
    /// Human-readable summary
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let cli = Cli::try_parse_from(["stage-ingest"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("stage-ingest.yaml"));
        assert_eq!(cli.format, OutputFormat::Pretty);
        assert!(cli.artifact_dir.is_none());
        assert!(cli.concurrency.is_none());
        assert!(!cli.dry_run);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "stage-ingest",
            "-c",
            "prod.yaml",
            "--artifact-dir",
            "out",
            "--concurrency",
            "4",
            "--dry-run",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("prod.yaml"));
        assert_eq!(cli.artifact_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.concurrency, Some(4));
        assert!(cli.dry_run);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
    }

    #[test]
    fn test_rejects_positional_arguments() {
        assert!(Cli::try_parse_from(["stage-ingest", "read"]).is_err());
    }
}
