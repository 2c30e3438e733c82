use std::path::Path;

use anyhow::bail;
use floodgate_core::FloodgateConfig;

pub fn init(path: &Path, base_url: &str, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let config = FloodgateConfig::scaffold(base_url);
    std::fs::write(path, config.to_toml_string()?)?;
    println!("✓ Generated {}", path.display());
    Ok(())
}
