//! The `leafcheck providers` command: resolved priority and setup status.

use clap::Args;
use leafcheck_core::{Config, LeafCheck, ProviderDescriptor};

/// Arguments for the `providers` command.
#[derive(Args, Debug)]
pub struct ProvidersArgs {
    /// Print the descriptors as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the providers command.
pub fn execute(args: ProvidersArgs, config: Config) -> anyhow::Result<()> {
    let leafcheck = LeafCheck::new(config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(leafcheck.providers())?);
        return Ok(());
    }

    print!("{}", render_table(leafcheck.providers()));
    let treatment = if leafcheck.has_ai_treatment() {
        "language model, static rules as fallback"
    } else {
        "static rules only"
    };
    println!("\nTreatment: {treatment}");
    Ok(())
}

/// Chain members numbered in priority order, excluded backends after.
fn render_table(descriptors: &[ProviderDescriptor]) -> String {
    let mut out = String::from("Detection chain (tried in order):\n");
    let mut rank = 0;
    for descriptor in descriptors.iter().filter(|d| d.available) {
        rank += 1;
        out.push_str(&format!("  {rank}. {:<12}", descriptor.name));
        if let Some(detail) = &descriptor.detail {
            out.push_str(&format!(" {detail}"));
        }
        out.push('\n');
    }

    let excluded: Vec<_> = descriptors.iter().filter(|d| !d.available).collect();
    if !excluded.is_empty() {
        out.push_str("\nExcluded:\n");
        for descriptor in excluded {
            out.push_str(&format!(
                "  - {:<12} {}\n",
                descriptor.name,
                descriptor.detail.as_deref().unwrap_or("unavailable")
            ));
        }
    }
    out
}
