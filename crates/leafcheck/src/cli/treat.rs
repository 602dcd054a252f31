//! The `leafcheck treat` command: treatment derivation on its own.

use clap::Args;
use leafcheck_core::{Config, LeafCheck, OutputFormat, OutputWriter};

/// Arguments for the `treat` command.
#[derive(Args, Debug)]
pub struct TreatArgs {
    /// Disease name, e.g. "Tomato Early Blight"
    #[arg(required = true)]
    pub disease: String,

    /// Detection confidence (0-100) passed to the model prompt
    #[arg(short, long, value_parser = parse_confidence)]
    pub confidence: Option<f32>,

    /// Only use the built-in rule table
    #[arg(long)]
    pub offline: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

fn parse_confidence(raw: &str) -> Result<f32, String> {
    let value: f32 = raw.parse().map_err(|_| format!("'{raw}' is not a number"))?;
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("confidence must be within 0-100, got {value}"))
    }
}

/// Execute the treat command.
pub async fn execute(args: TreatArgs, mut config: Config) -> anyhow::Result<()> {
    if args.offline {
        config.treatment.ai_enabled = false;
    }
    let pretty = args.pretty || config.output.pretty;
    let leafcheck = LeafCheck::new(config);

    let plan = leafcheck.derive_treatment(&args.disease, args.confidence).await;
    tracing::debug!(ai_generated = plan.ai_generated, "Treatment derived for {}", args.disease);

    let mut writer = OutputWriter::new(std::io::stdout().lock(), OutputFormat::Json, pretty);
    writer.write(&plan)?;
    writer.flush()?;
    Ok(())
}
