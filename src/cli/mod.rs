pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::{self, AppState};
use crate::config;
use crate::database::models::UserRole;

#[derive(Parser)]
#[command(name = "glue")]
#[command(about = "GLUE admin CLI - maintenance tasks against the configured store")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply database migrations")]
    Migrate,

    #[command(about = "List membership plans")]
    Plans,

    #[command(about = "Delete users and everything they own")]
    DeleteUsers {
        #[arg(required = true, help = "User ids")]
        ids: Vec<Uuid>,
    },

    #[command(about = "Create a staff account (password read from GLUE_ADMIN_PASSWORD)")]
    CreateAdmin {
        #[arg(help = "Login email")]
        email: String,

        #[arg(help = "Display name")]
        name: String,

        #[arg(long, default_value = "admin", help = "admin or moderator")]
        role: UserRole,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Application state over the store named by the environment configuration.
pub async fn open_state() -> anyhow::Result<AppState> {
    let config = config::config().clone();
    let store = app::open_store(&config).await?;
    Ok(AppState::new(store, config))
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Plans => commands::plans::handle(output_format).await,
        Commands::DeleteUsers { ids } => commands::users::delete(ids, output_format).await,
        Commands::CreateAdmin { email, name, role } => {
            commands::users::create_admin(&email, &name, role, output_format).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_users_requires_ids() {
        assert!(Cli::try_parse_from(["glue", "delete-users"]).is_err());

        let id = Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from(["glue", "--json", "delete-users", &id]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        assert!(matches!(cli.command, Commands::DeleteUsers { ids } if ids.len() == 1));
    }

    #[test]
    fn test_create_admin_role_parsing() {
        let cli = Cli::try_parse_from(["glue", "create-admin", "a@b.org", "Ada", "--role", "moderator"]).unwrap();
        assert!(matches!(cli.command, Commands::CreateAdmin { role: UserRole::Moderator, .. }));

        assert!(Cli::try_parse_from(["glue", "create-admin", "a@b.org", "Ada", "--role", "root"]).is_err());
    }
}
