use clap::Parser;
use dcm2tables_core::cli::export::write_tsv_tables;
use dcm2tables_core::cli::input::collect_inputs;
use dcm2tables_core::cli::{Cli, OutputFormat};
use dcm2tables_core::{
    Diagnostics, DicomParser, ParserOptions, Result, RulesDictionary, TableSet, TextReport,
};
use log::{error, info};
use std::path::Path;
use std::process;
use std::time::Duration;

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(0) => {}
        Ok(failed) => {
            error!("{} file(s) could not be fully processed", failed);
            process::exit(2);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Processes every input and writes the merged tables
///
/// Returns how many files failed. Tables a failed file produced before its
/// error are still part of the output.
fn run(cli: &Cli) -> Result<usize> {
    let rules = RulesDictionary::from_path(&cli.rules)?;
    let options = parser_options(cli);
    let files = collect_inputs(&cli.inputs)?;

    info!("Processing {} DICOM file(s)", files.len());

    let mut tables = TableSet::new();
    let mut failed = 0;
    for path in &files {
        let mut parser = match DicomParser::open(path, rules.clone(), options.clone()) {
            Ok(parser) => parser.with_diagnostics(Diagnostics::global()),
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                failed += 1;
                continue;
            }
        };

        match parser.parse() {
            Ok(()) => info!("Processed {} ({})", path.display(), parser.object_kind()),
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                failed += 1;
            }
        }
        tables.merge(parser.into_tables());
    }

    output_tables(&tables, cli)?;
    Ok(failed)
}

fn parser_options(cli: &Cli) -> ParserOptions {
    ParserOptions {
        temp_dir: cli.temp_dir.clone(),
        dcmqi_path: cli.dcmqi_path.clone(),
        converter_timeout: (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout)),
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn output_tables(tables: &TableSet, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            print!("{}", TextReport::new(tables));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(tables)?);
        }
        OutputFormat::Tsv => {
            // clap enforces --output-dir for tsv
            let dir = cli.output_dir.as_deref().unwrap_or(Path::new("."));
            for path in write_tsv_tables(tables, dir)? {
                info!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}
