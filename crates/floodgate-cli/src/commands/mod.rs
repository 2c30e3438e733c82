use std::path::Path;

use anyhow::Context;
use floodgate_core::FloodgateConfig;
use tracing::debug;

pub mod history;
pub mod init;
pub mod run;

pub(crate) fn load_config(path: &Path) -> anyhow::Result<FloodgateConfig> {
    let config = FloodgateConfig::from_file(path)
        .with_context(|| format!("loading config from {}", path.display()))?;
    debug!(path = %path.display(), base_url = %config.base_url, "config loaded");
    Ok(config)
}
