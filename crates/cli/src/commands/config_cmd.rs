//! `baton config`: print configuration.

use std::path::Path;

use baton_config::BatonConfig;

pub fn run(
    config: &BatonConfig,
    explicit_path: Option<&Path>,
    default: bool,
    path: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if path {
        let config_path = explicit_path
            .map(Path::to_path_buf)
            .unwrap_or_else(BatonConfig::config_path);
        println!("{}", config_path.display());
        return Ok(());
    }

    if default {
        print!("{}", BatonConfig::default_toml());
    } else {
        print!("{}", config.to_toml());
    }
    Ok(())
}
