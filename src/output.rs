use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
    Ndjson,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Ndjson => "ndjson",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "ndjson" => Ok(OutputFormat::Ndjson),
            other => anyhow::bail!("unknown output format {:?}", other),
        }
    }
}

/// Parse a format name from settings, falling back to JSON.
pub fn format_or_json(name: &str) -> OutputFormat {
    name.parse().unwrap_or_else(|e| {
        warn!("{}, writing JSON instead", e);
        OutputFormat::Json
    })
}

/// `twitch_streams_<UTC timestamp>`, used as the output file stem.
pub fn timestamped_basename() -> String {
    format!(
        "twitch_streams_{}",
        chrono::Utc::now().format("%Y%m%dT%H%M%SZ")
    )
}

/// Write `records` to `<output_dir>/<base_filename>.<ext>` and return the path.
pub fn save_dataset<T: Serialize>(
    records: &[T],
    output_dir: &Path,
    base_filename: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let path = output_dir.join(format!("{}.{}", base_filename, format.extension()));
    info!(
        "Saving {} records as {} format to {}",
        records.len(),
        format,
        path.display()
    );

    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, records)?;
            writeln!(writer)?;
        }
        OutputFormat::Ndjson => {
            for record in records {
                serde_json::to_writer(&mut writer, record)?;
                writeln!(writer)?;
            }
        }
        OutputFormat::Csv => write_csv(records, &mut writer)?,
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn write_csv<T: Serialize, W: Write>(records: &[T], out: W) -> Result<()> {
    let rows: Vec<Map<String, Value>> = records
        .iter()
        .map(|r| -> Result<Map<String, Value>> {
            match serde_json::to_value(r)? {
                Value::Object(map) => Ok(map),
                _ => anyhow::bail!("CSV rows must serialize to objects"),
            }
        })
        .collect::<Result<_>>()?;

    let Some(first) = rows.first() else {
        warn!("No records provided, CSV file will be empty");
        return Ok(());
    };

    let mut columns: Vec<&String> = first.keys().collect();
    columns.sort();

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&columns)?;
    for row in &rows {
        writer.write_record(columns.iter().map(|c| csv_cell(row.get(*c))))?;
    }
    writer.flush()?;
    Ok(())
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}
