pub mod file;
pub mod stdin;

use clap::Args;
use underwriting_core::underwriting::inputs::ModelInputs;
use underwriting_core::underwriting::sanitize::inputs_from_json;
use underwriting_core::underwriting::snapshot::{deal_form, is_snapshot};

/// Where to read the deal from
#[derive(Args, Debug, Clone)]
pub struct DealArgs {
    /// Path to a JSON deal: bare inputs or a saved snapshot. Reads stdin when omitted.
    #[arg(long)]
    pub input: Option<String>,
}

/// A deal read from disk or stdin, sanitized, with any parse warnings.
pub struct LoadedDeal {
    pub inputs: ModelInputs,
    pub warnings: Vec<String>,
}

pub fn load_deal(args: &DealArgs) -> Result<LoadedDeal, Box<dyn std::error::Error>> {
    let document = if let Some(ref path) = args.input {
        file::read_json_value(path)?
    } else if let Some(data) = stdin::read_stdin()? {
        data
    } else {
        return Err("--input <deal.json> or piped stdin required".into());
    };

    if is_snapshot(&document) {
        tracing::debug!(
            id = document.get("id").and_then(|v| v.as_str()).unwrap_or_default(),
            "reading inputs from deal snapshot"
        );
    }

    let mut warnings = Vec::new();
    let inputs = inputs_from_json(deal_form(&document), &mut warnings)?;
    Ok(LoadedDeal { inputs, warnings })
}
