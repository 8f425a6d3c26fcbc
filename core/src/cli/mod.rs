pub mod export;
pub mod input;
pub mod report;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for dcm2tables
#[derive(Parser, Debug)]
#[command(name = "dcm2tables")]
#[command(about = "Flatten DICOM attributes into rule-driven tables")]
#[command(version)]
pub struct Cli {
    /// DICOM files or directories containing them
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Rules dictionary (JSON: table name -> attribute list)
    #[arg(short, long, value_name = "FILE")]
    pub rules: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Directory receiving one TSV file per table
    #[arg(short, long, value_name = "DIR", required_if_eq("format", "tsv"))]
    pub output_dir: Option<PathBuf>,

    /// Base directory for converter scratch files
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Directory holding the dcmqi executables
    #[arg(long, value_name = "DIR", env = "DCMQI_PATH")]
    pub dcmqi_path: Option<PathBuf>,

    /// Converter time limit in seconds, 0 to wait indefinitely
    #[arg(long, value_name = "SECONDS", default_value_t = 300)]
    pub timeout: u64,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
    /// Tab-separated files, one per table
    Tsv,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from([
            "dcm2tables",
            "--rules",
            "rules.json",
            "--format",
            "json",
            "--timeout",
            "0",
            "a.dcm",
            "series/",
        ])
        .unwrap();

        assert_eq!(
            cli.inputs,
            vec![PathBuf::from("a.dcm"), PathBuf::from("series/")]
        );
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.timeout, 0);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_tsv_requires_output_dir() {
        let args = ["dcm2tables", "-r", "rules.json", "-f", "tsv", "a.dcm"];
        assert!(Cli::try_parse_from(args).is_err());

        let cli = Cli::try_parse_from([
            "dcm2tables",
            "-r",
            "r.json",
            "-f",
            "tsv",
            "-o",
            "out",
            "a.dcm",
        ])
        .unwrap();
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_inputs_and_rules_required() {
        assert!(Cli::try_parse_from(["dcm2tables", "--rules", "rules.json"]).is_err());
        assert!(Cli::try_parse_from(["dcm2tables", "a.dcm"]).is_err());
    }
}
