//! Configuration view and validation: `dealflow config`.

use anyhow::Result;

use dealflow::dealflow_config::DealflowConfig;

use super::super::ConfigCommands;

pub fn cmd_config(config: &DealflowConfig, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            if config.is_initialized() {
                println!("Config file: {}", config.config_path().display());
            } else {
                println!("No dealflow.toml found; showing defaults.");
            }
            println!();
            let toml = &config.toml;
            println!("[server]");
            println!("  host = \"{}\"", toml.server.host);
            match config.port() {
                Ok(port) => println!("  port = {}", port),
                Err(e) => println!("  port = {} ({})", toml.server.port, e),
            }
            println!("  db_path = \"{}\"", config.db_path().display());
            println!("  dev_mode = {}", toml.server.dev_mode);
            println!();
            println!("[pipeline]");
            println!("  won_stage = \"{}\"", toml.pipeline.won_stage);
            println!("  lost_stage = \"{}\"", toml.pipeline.lost_stage);
            println!();
            println!("[reporting]");
            println!("  trend_months = {}", toml.reporting.trend_months);
            println!("  top_performers = {}", toml.reporting.top_performers);
            println!(
                "  activity_window_days = {}",
                toml.reporting.activity_window_days
            );
            println!();
            println!("[logging]");
            println!("  level = \"{}\"", config.log_level());
            println!("  format = \"{}\"", toml.logging.format.as_str());
            println!("  file = {}", toml.logging.file);
            println!("  directory = \"{}\"", config.log_dir().display());
        }
        Some(ConfigCommands::Validate) => {
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("{}", console::style("Configuration is valid.").green());
            } else {
                for warning in &warnings {
                    println!("{} {}", console::style("warning:").yellow().bold(), warning);
                }
            }
        }
    }
    Ok(())
}
