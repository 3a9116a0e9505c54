use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::{self, StoreBackend};
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    if config.database.backend != StoreBackend::Postgres {
        return output_error(&output_format, "Migrations only apply to the postgres backend");
    }

    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;
    output_success(&output_format, "Migrations applied", None)
}
