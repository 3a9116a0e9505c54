use serde_json::json;

use crate::cli::utils::*;
use crate::cli::{open_state, OutputFormat};
use crate::services::plans;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let state = open_state().await?;
    let plans = plans::list(&state).await?;

    if plans.is_empty() {
        return output_empty_collection(&output_format, "plans", "No plans configured");
    }

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "plans": plans }))?);
        }
        OutputFormat::Text => {
            println!("{:<12} {:<20} {:>10} {:<5} {}", "ID", "LABEL", "PRICE", "CUR", "FLAGS");
            println!("{}", "-".repeat(60));

            for plan in &plans {
                let mut flags = Vec::new();
                if !plan.is_active {
                    flags.push("inactive");
                }
                if plan.is_featured {
                    flags.push("featured");
                }
                println!(
                    "{:<12} {:<20} {:>10} {:<5} {}",
                    plan.plan_id,
                    plan.label,
                    plan.price,
                    plan.currency,
                    flags.join(",")
                );
            }
        }
    }

    Ok(())
}
