//! Configuration view and validation commands: `tasker config`.

use anyhow::Result;
use std::path::Path;

use tasker::config::{TaskerToml, local_config_path};

use super::load_config;
use crate::{Cli, ConfigCommands};

pub fn cmd_config(cli: &Cli, work_dir: &Path, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            let config = load_config(cli, work_dir)?;
            println!();
            println!("Tasker Configuration");
            println!("====================");
            println!();

            match config.path {
                Some(ref path) => println!("Config file: {}", path.display()),
                None => {
                    println!("No tasker.toml found. Using default configuration.");
                    println!("Run 'tasker config init' to create one.");
                }
            }
            println!();

            let toml = &config.toml;
            println!("[server]");
            println!("  base_url = \"{}\"", toml.server.base_url);
            println!(
                "  token = {}",
                if toml.server.token.is_some() {
                    "(set)"
                } else {
                    "(unset)"
                }
            );
            println!("  timeout_secs = {}", toml.server.timeout_secs);
            println!();
            println!("[board]");
            println!(
                "  activation_distance = {}",
                toml.board.activation_distance
            );
            if let Some(project) = toml.board.default_project {
                println!("  default_project = {}", project);
            }
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  base_url = \"{}\"", config.base_url());
            println!(
                "  token = {}",
                if config.token().is_some() {
                    "(set)"
                } else {
                    "(unset)"
                }
            );
            match config.default_project() {
                Some(project) => println!("  project = {}", project),
                None => println!("  project = (none)"),
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let config = load_config(cli, work_dir)?;
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            let config_path = match cli.config {
                Some(ref path) => path.clone(),
                None => local_config_path(work_dir),
            };
            if config_path.exists() {
                println!("tasker.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            TaskerToml::default().save(&config_path)?;

            println!("Created tasker.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [server] base_url, token, timeout_secs");
            println!("  - [board] activation_distance, default_project");
            println!();
        }
    }

    Ok(())
}
