//! services/practice/src/bin/practice.rs

use chrono::Local;
use practice_lib::{app::AppState, config::Config, error::AppError};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded.");

    // --- 2. Build the Shared AppState ---
    let backup_dir = config.backup_dir.clone();
    let state = AppState::from_config(config);

    // --- 3. Run the requested command ---
    let command = std::env::args().nth(1).unwrap_or_else(|| "export".to_string());
    match command.as_str() {
        "reset" => {
            state.records.clear_all_data().await?;
            info!("Practice data reset.");
        }
        "stats" => {
            state.records.initialize().await?;
            report(&state).await?;
        }
        "export" => {
            state.records.initialize().await?;
            report(&state).await?;
            let path = state.records.write_backup(&backup_dir).await?;
            info!("Backup available at {}", path.display());
        }
        other => {
            return Err(AppError::Usage(format!(
                "unknown command '{}', expected export, stats or reset",
                other
            )))
        }
    }

    Ok(())
}

async fn report(state: &AppState) -> Result<(), AppError> {
    let stats = state.records.storage_stats().await?;
    info!(
        patients = stats.patients,
        incidents = stats.incidents,
        files = stats.files,
        storage_kb = stats.storage_kb,
        "Storage status."
    );

    let summary = state.records.dashboard(Local::now().naive_local()).await;
    info!(
        upcoming = summary.upcoming.len(),
        completed = summary.completed_treatments,
        pending = summary.pending_treatments,
        revenue = summary.total_revenue,
        "Dashboard summary."
    );
    Ok(())
}
