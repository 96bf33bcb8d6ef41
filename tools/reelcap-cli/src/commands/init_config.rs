//! Write the default configuration file.

use reelcap_common::config::{config_file_path, AppConfig};

pub fn run(force: bool) -> anyhow::Result<()> {
    let path = config_file_path();
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (pass --force to overwrite)",
            path.display()
        );
    }

    let saved = AppConfig::default().save()?;
    println!("Wrote default config: {}", saved.display());
    Ok(())
}
