use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::*;
use crate::cli::{open_state, OutputFormat};
use crate::database::models::UserRole;
use crate::services::{registration, users};

/// Same per-user semantics as POST /deleteUsers; exits non-zero if any failed.
pub async fn delete(ids: Vec<Uuid>, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = open_state().await?;
    let report = users::delete_many(&state, None, &ids).await?;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            for result in &report.results {
                match &result.error {
                    None => println!("✓ {}", result.user_id),
                    Some(error) => println!("✗ {} {}", result.user_id, error),
                }
            }
        }
    }

    if report.results.iter().any(|r| !r.success) {
        anyhow::bail!("Some users could not be deleted");
    }
    Ok(())
}

pub async fn create_admin(email: &str, name: &str, role: UserRole, output_format: OutputFormat) -> anyhow::Result<()> {
    if role == UserRole::User {
        anyhow::bail!("Role must be admin or moderator");
    }
    let password = env_secret("GLUE_ADMIN_PASSWORD")?;

    let state = open_state().await?;
    let created = registration::create_staff(&state, email, name, &password, role).await?;
    output_success(
        &output_format,
        &format!("Created {} {}", role, email),
        Some(json!({ "id": created.id })),
    )
}
