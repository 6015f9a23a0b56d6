//! CLI command-name contract for logging and routing.

use crate::cli::parse::{Commands, ConfigCommands};

/// Command name string for log spans (e.g. "deploy", "config.show").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Hash { .. } => "hash".to_string(),
        Commands::Compare { .. } => "compare".to_string(),
        Commands::Plan { .. } => "plan".to_string(),
        Commands::Deploy { .. } => "deploy".to_string(),
        Commands::Config { command } => format!("config.{}", config_command_name(command)),
    }
}

pub fn config_command_name(command: &ConfigCommands) -> &'static str {
    match command {
        ConfigCommands::Show { .. } => "show",
        ConfigCommands::Validate => "validate",
    }
}
