//! The `leafcheck canonicalize` command.

use clap::Args;
use leafcheck_core::{canonicalize, format_label};

/// Arguments for the `canonicalize` command.
#[derive(Args, Debug)]
pub struct CanonicalizeArgs {
    /// Free text, e.g. a model answer
    #[arg(required = true)]
    pub text: String,

    /// Treat the input as a classifier label token (e.g. Tomato___Early_blight)
    #[arg(long)]
    pub label: bool,
}

/// Execute the canonicalize command.
pub fn execute(args: CanonicalizeArgs) -> anyhow::Result<()> {
    println!("{}", render(&args));
    Ok(())
}

fn render(args: &CanonicalizeArgs) -> String {
    if args.label {
        format_label(&args.text)
    } else {
        canonicalize(&args.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_text_and_label_modes() {
        let text = CanonicalizeArgs {
            text: "Possible early blight with dark rings".to_string(),
            label: false,
        };
        assert_eq!(render(&text), "Early Blight");

        let label = CanonicalizeArgs {
            text: "Tomato___Early_blight".to_string(),
            label: true,
        };
        assert_eq!(render(&label), "Tomato - Early Blight");
    }
}
