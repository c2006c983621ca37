//! tabsource CLI: inspect data sources from the command line.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use tabsource::legacy::normalize_mapping;
use tabsource::{supported_formats, DataSource, Records};
use tabsource_core::types::RowBatch;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "tabsource")]
#[command(about = "Read tabular sources as datasets and row records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered format keys
    Formats,

    /// Print the first rows of a source
    Head {
        #[command(flatten)]
        source: SourceArgs,

        /// Number of rows
        #[arg(short, default_value = "10")]
        n: usize,
    },

    /// Print row records as JSON lines
    Records {
        #[command(flatten)]
        source: SourceArgs,

        /// Stop after this many records
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print mapped row records as JSON lines
    Mapped {
        #[command(flatten)]
        source: SourceArgs,

        /// Stop after this many records
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Build a source (and its mapped view, if any) and report problems
    Validate {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// YAML data source definition
    #[arg(short, long, conflicts_with_all = ["source", "format"])]
    config: Option<PathBuf>,

    /// Source path, glob or backend name (repeat for several paths)
    #[arg(short, long)]
    source: Vec<String>,

    /// Format key (overrides the one inferred from the source)
    #[arg(short, long)]
    format: Option<String>,

    /// Reader attribute as key=value; values are parsed as JSON when possible
    #[arg(short, long = "attr", value_parser = parse_attr)]
    attributes: Vec<(String, serde_json::Value)>,

    /// Mapping as a JSON object, e.g. '{"text": ["title", "body"]}'
    #[arg(short, long)]
    mapping: Option<String>,
}

fn parse_attr(s: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}

impl SourceArgs {
    fn open(self) -> CliResult<DataSource> {
        if let Some(config) = self.config {
            return Ok(DataSource::from_yaml(config)?);
        }
        let mut builder = DataSource::builder();
        match self.source.len() {
            0 => {}
            1 => builder = builder.source(self.source[0].as_str()),
            _ => builder = builder.source(self.source),
        }
        if let Some(format) = self.format {
            builder = builder.format(format);
        }
        for (key, value) in self.attributes {
            builder = builder.attribute(key, value);
        }
        if let Some(mapping) = self.mapping {
            builder = builder.mapping(normalize_mapping(serde_json::from_str(&mapping)?)?);
        }
        Ok(builder.build()?)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Formats => {
            for key in supported_formats() {
                println!("{key}");
            }
            Ok(())
        }
        Commands::Head { source, n } => source.open().and_then(|ds| print_head(&ds, n)),
        Commands::Records { source, limit } => source
            .open()
            .and_then(|ds| print_records(ds.to_records(), limit)),
        Commands::Mapped { source, limit } => source
            .open()
            .and_then(|ds| print_records(ds.to_mapped_records()?, limit)),
        Commands::Validate { source } => source.open().and_then(|ds| validate(&ds)),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_head(ds: &DataSource, n: usize) -> CliResult<()> {
    let batch = ds.head(n)?;
    let index = ds.to_dataframe().index_name().unwrap_or("");
    println!("{}\t{}", index, batch.column_names().join("\t"));
    for r in 0..batch.num_rows() {
        println!("{}\t{}", batch.index[r], row_text(&batch, r));
    }
    Ok(())
}

fn row_text(batch: &RowBatch, r: usize) -> String {
    batch
        .row(r)
        .iter()
        .map(|cell| cell.to_string())
        .collect::<Vec<_>>()
        .join("\t")
}

fn print_records(records: Records, limit: Option<usize>) -> CliResult<()> {
    for record in records.take(limit.unwrap_or(usize::MAX)) {
        let json: serde_json::Map<String, serde_json::Value> = record?
            .into_iter()
            .map(|(k, v)| (k, v.to_json()))
            .collect();
        println!("{}", serde_json::Value::Object(json));
    }
    Ok(())
}

fn validate(ds: &DataSource) -> CliResult<()> {
    let dataset = ds.to_dataframe();
    println!("format: {}", ds.format());
    println!("columns: {}", dataset.columns().join(", "));
    if let Some(index) = dataset.index_name() {
        println!("index: {index}");
    }
    println!("rows: {}", dataset.count()?);
    if ds.mapping().is_some() {
        let mapped = ds.to_mapped_dataframe()?;
        println!("mapped columns: {}", mapped.columns().join(", "));
    }
    println!("✓ Data source is valid");
    Ok(())
}
