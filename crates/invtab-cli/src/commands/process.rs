//! Process command - extract line items from a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use invtab_core::export::{WorksheetLayout, HEADERS};
use invtab_core::models::Invoice;

use super::{build_processor, load_config, needs_recognizer};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (image, PDF, or JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory for the text recognizer
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// JSON invoice
    Json,
    /// One CSV row per line item
    Csv,
    /// Human-readable summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let config = load_config(config_path)?;
    let files = vec![args.input.clone()];
    let processor = build_processor(&config, args.model_dir.as_deref(), needs_recognizer(&files));

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Processing {}...", args.input.display()));

    let input = args.input.clone();
    let result = tokio::task::spawn_blocking(move || processor.process_path(&input)).await?;
    pb.finish_and_clear();

    let invoice = result?.into_invoice();
    info!(
        "Extracted {} items from {} in {:?}",
        invoice.items.len(),
        args.input.display(),
        start.elapsed()
    );

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&invoice)?,
        OutputFormat::Csv => format_csv(&invoice)?,
        OutputFormat::Text => format_text(&invoice),
    };

    match args.output {
        Some(path) => {
            fs::write(&path, &output)?;
            println!(
                "{} Results written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", output),
    }

    Ok(())
}

/// The worksheet's header and item rows, without the state/terms preamble.
fn format_csv(invoice: &Invoice) -> anyhow::Result<String> {
    let layout = WorksheetLayout::build(invoice);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for row in layout.data_rows() {
        writer.write_record(row.texts())?;
    }

    Ok(String::from_utf8(writer.into_inner()?)?)
}

fn format_text(invoice: &Invoice) -> String {
    let mut out = String::new();

    out.push_str(&format!("Invoice: {}\n", invoice.invoice_number));
    out.push_str(&format!("Date: {}\n", invoice.date));
    if !invoice.state_name.is_empty() {
        out.push_str(&format!("State: {}\n", invoice.state_name));
    }
    if !invoice.terms_of_delivery.is_empty() {
        out.push_str(&format!("Terms of delivery: {}\n", invoice.terms_of_delivery));
    }

    out.push_str(&format!("\nLine items ({}):\n", invoice.items.len()));
    for (index, item) in invoice.items.iter().enumerate() {
        out.push_str(&format!(
            "  {:>3}. {} | {} | {} {} @ {} = {}\n",
            index + 1,
            item.part_no,
            item.description,
            item.quantity,
            item.per,
            item.rate,
            item.amount
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use invtab_core::models::LineItem;

    fn invoice() -> Invoice {
        let item = LineItem {
            part_no: "P1".to_string(),
            description: "Bolt, zinc".to_string(),
            quantity: "10".to_string(),
            rate: "2.50".to_string(),
            per: "Nos.".to_string(),
            amount: "25.00".to_string(),
            ..Default::default()
        };
        Invoice::extracted("INV-scan", "2026-01-05", vec![item])
    }

    #[test]
    fn test_format_csv_quotes_and_numbers_rows() {
        let csv = format_csv(&invoice()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("SI No.,"));
        assert!(lines[1].starts_with("1,P1,\"Bolt, zinc\","));
    }

    #[test]
    fn test_format_csv_matches_worksheet_rows() {
        let invoice = invoice();
        let csv = format_csv(&invoice).unwrap();
        let layout = WorksheetLayout::build(&invoice);

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, HEADERS.to_vec());

        let records: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        let expected: Vec<Vec<String>> = layout.data_rows().iter().map(|r| r.texts()).collect();
        assert_eq!(records, expected);
    }

    #[test]
    fn test_format_text_summary() {
        let text = format_text(&invoice());
        assert!(text.contains("Invoice: INV-scan"));
        assert!(text.contains("Line items (1):"));
        assert!(!text.contains("State:"));
    }
}
