//! The `leafcheck detect` command for diagnosing leaf images.

use clap::{Args, ValueEnum};
use leafcheck_core::output::OutputFormat as CoreOutputFormat;
use leafcheck_core::{AnalyzeOptions, Config, DiagnosisReport, LeafCheck, OutputWriter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Arguments for the `detect` command.
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Image files to diagnose
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to `output.format` from the config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Skip treatment derivation
    #[arg(long)]
    pub no_treatment: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Output format from the flag, else from config, else JSON.
fn resolve_format(flag: Option<OutputFormat>, config: &Config) -> CoreOutputFormat {
    match flag {
        Some(format) => format.into(),
        None => CoreOutputFormat::parse(&config.output.format).unwrap_or_else(|| {
            tracing::warn!(
                "Unknown output.format '{}' in config, using json",
                config.output.format
            );
            CoreOutputFormat::Json
        }),
    }
}

/// Execute the detect command.
pub async fn execute(args: DetectArgs, config: Config) -> anyhow::Result<()> {
    let format = resolve_format(args.format, &config);
    let pretty = args.pretty || config.output.pretty;
    let options = AnalyzeOptions {
        treatment: !args.no_treatment,
    };

    let leafcheck = LeafCheck::new(config);

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    let mut writer = OutputWriter::new(sink, format, pretty);

    let mut reports: Vec<DiagnosisReport> = Vec::with_capacity(args.images.len());
    let mut failed = 0usize;

    for path in &args.images {
        tracing::info!("Diagnosing {}", path.display());
        let report = leafcheck.analyze_file(path, options.clone()).await;

        if let Some(error) = &report.result.error {
            failed += 1;
            tracing::warn!("{}: {error}", path.display());
        } else {
            tracing::info!(
                provider = %report.result.provider_label,
                "{}: {} ({:.0}%)",
                path.display(),
                report.result.disease_name,
                report.result.confidence
            );
        }

        // JSONL streams as it goes; JSON is written once at the end
        if format == CoreOutputFormat::JsonLines {
            writer.write(&report)?;
            writer.flush()?;
        } else {
            reports.push(report);
        }
    }

    if format == CoreOutputFormat::Json {
        writer.write_all(&reports)?;
    }
    writer.flush()?;

    tracing::info!(
        "Diagnosed {} image(s), {} rejected",
        args.images.len(),
        failed
    );
    if let Some(path) = &args.output {
        eprintln!("Wrote {} report(s) to {}", writer.items_written(), path.display());
    }
    Ok(())
}
