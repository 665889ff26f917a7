use anyhow::Result;
use tracing::error;

use turnover_sync::infrastructure::{ConfigManager, init_logging_with_config, log_system_info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = ConfigManager::from_args()?.load()?;
    init_logging_with_config(&config.logging)?;
    log_system_info(&config.logging);

    if let Err(e) = turnover_sync::run(config).await {
        error!("💥 Sync aborted: {:#}", e);
        return Err(e);
    }
    Ok(())
}
