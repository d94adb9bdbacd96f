//! Config loading and database opening shared by every command.

use std::path::Path;

use anyhow::Context;
use tracing::debug;

use beacon_config::{BeaconConfig, PROJECT_DIR};
use beacon_db::{BeaconService, ServiceSettings};

/// Load `.env`, then the layered config, then validate it.
pub fn load_config(config_dir: Option<&Path>) -> anyhow::Result<BeaconConfig> {
    let dir = config_dir.unwrap_or_else(|| Path::new(PROJECT_DIR));
    load_dotenv(dir)?;

    let config = BeaconConfig::load_from_dir(dir)
        .with_context(|| format!("failed to load config from {}", dir.display()))?;
    config.validate().context("invalid configuration")?;
    debug!(db = %config.database.path, "configuration loaded");
    Ok(config)
}

/// Prefer a `.env` next to the config directory, else the working directory's.
fn load_dotenv(config_dir: &Path) -> anyhow::Result<()> {
    let beside = config_dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.join(".env"));
    if let Some(env_path) = beside
        && env_path.exists()
    {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
        return Ok(());
    }
    dotenvy::dotenv().ok();
    Ok(())
}

/// Open the configured database as an unscoped service.
pub async fn open_service(config: &BeaconConfig) -> anyhow::Result<BeaconService> {
    BeaconService::open_local(&config.database.path, ServiceSettings::from_config(config))
        .await
        .with_context(|| format!("failed to open database at {}", config.database.path))
}
