//! Init command: write a starter config and create the working directories

use crate::config::CONFIG_FILENAME;
use crate::{OrderdConfig, Result};
use colored::Colorize;
use dialoguer::Confirm;
use std::fs;

pub fn run(force: bool) -> Result<()> {
    let root = std::env::current_dir()?;
    let config_path = root.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        let overwrite = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", CONFIG_FILENAME))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("{}", "Keeping existing configuration.".yellow());
            return Ok(());
        }
    }

    let config = OrderdConfig::default();
    config.save(&root)?;
    fs::create_dir_all(root.join(&config.data_dir))?;
    fs::create_dir_all(root.join(&config.import_dir))?;
    fs::create_dir_all(root.join(&config.sidecar_dir))?;

    println!("{}", format!("✓ Wrote {}", CONFIG_FILENAME).green());
    println!(
        "{}",
        format!("✓ Import directory: {}", config.import_dir.display()).cyan()
    );
    println!(
        "{}",
        "Edit the [notify] section to route stage notifications.".cyan()
    );

    Ok(())
}
