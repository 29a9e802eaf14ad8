//! Export command - extract line items from many documents into one worksheet.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, ValueEnum};
use console::style;
use futures_util::{stream, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info};

use invtab_core::export::{export_invoice, ExportFormat};
use invtab_core::models::{sample_invoice, SourceDocument};
use invtab_core::pipeline::is_skippable;
use invtab_core::combine;

use super::{build_processor, load_config, needs_recognizer};

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Input file, directory, or glob pattern
    #[arg(short, long, default_value = ".")]
    input: String,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Skip extraction and export the built-in sample invoice
    #[arg(long)]
    export_only: bool,

    /// Output file name prefix (default from config: Invoice_Export)
    #[arg(long)]
    export_name: Option<String>,

    /// Output file format (default from config: xlsx)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Number of documents processed in parallel
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Model directory for the text recognizer
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    /// Excel workbook
    Xlsx,
    /// Comma-separated values
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Xlsx => ExportFormat::Xlsx,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

/// What happened to one input file.
enum Outcome {
    Extracted(SourceDocument),
    Skipped(String),
    Failed(String),
}

pub async fn run(args: ExportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(name) = &args.export_name {
        config.export.export_name = name.clone();
    }
    config.validate()?;
    let format = args.format.map(ExportFormat::from).unwrap_or(config.export.format);

    if args.export_only {
        println!("{} Exporting sample invoice...", style("ℹ").blue());
        let path = export_invoice(&sample_invoice(), &args.output, &config.export, format)?;
        println!(
            "{} Sample invoice exported to: {}",
            style("✓").green(),
            path.display()
        );
        return Ok(());
    }

    let files = collect_inputs(&args.input)?;
    if files.is_empty() {
        info!("No input files found for {}", args.input);
        println!("No data to export.");
        return Ok(());
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let processor = Arc::new(build_processor(
        &config,
        args.model_dir.as_deref(),
        needs_recognizer(&files),
    ));

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // `buffered` keeps submission order however the workers finish.
    let outcomes: Vec<(PathBuf, Outcome)> = stream::iter(files)
        .map(|path| {
            let processor = Arc::clone(&processor);
            async move {
                let job_path = path.clone();
                let joined =
                    tokio::task::spawn_blocking(move || processor.process_path(&job_path)).await;
                let outcome = match joined {
                    Ok(Ok(document)) => Outcome::Extracted(document),
                    Ok(Err(e)) if is_skippable(&e) => Outcome::Skipped(e.to_string()),
                    Ok(Err(e)) => Outcome::Failed(e.to_string()),
                    Err(e) => Outcome::Failed(format!("worker panicked: {}", e)),
                };
                (path, outcome)
            }
        })
        .buffered(args.jobs.max(1))
        .inspect(|_| pb.inc(1))
        .collect()
        .await;

    pb.finish_and_clear();

    let mut documents = Vec::new();
    let mut failed = 0usize;
    let mut skipped = 0usize;
    for (path, outcome) in outcomes {
        match outcome {
            Outcome::Extracted(document) => {
                debug!("Extracted {}", path.display());
                documents.push(document);
            }
            Outcome::Skipped(reason) => {
                info!("Skipping {}: {}", path.display(), reason);
                skipped += 1;
            }
            Outcome::Failed(reason) => {
                error!("Failed to process {}: {}", path.display(), reason);
                println!(
                    "{} Error processing {}: {}",
                    style("✗").red(),
                    path.display(),
                    reason
                );
                failed += 1;
            }
        }
    }

    println!(
        "   {} extracted, {} failed, {} skipped in {:?}",
        style(documents.len()).green(),
        style(failed).red(),
        skipped,
        start.elapsed()
    );

    let Some(invoice) = combine(documents) else {
        println!("No data to export.");
        return Ok(());
    };

    let path = export_invoice(&invoice, &args.output, &config.export, format)?;
    println!(
        "{} Data exported to: {}",
        style("✓").green(),
        path.display()
    );

    Ok(())
}

/// Expand the input argument: a file, a directory (its files in name order), or a glob pattern.
fn collect_inputs(input: &str) -> anyhow::Result<Vec<PathBuf>> {
    let path = Path::new(input);

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if path.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(path)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        return Ok(files);
    }

    let mut files: Vec<PathBuf> = glob(input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}
