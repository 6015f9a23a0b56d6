//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, config_command_name};
pub use output::{map_error, CommandOutput};
pub use parse::{Cli, Commands, ConfigCommands, TargetArgs};
pub use presentation::{
    format_comparison_json, format_comparison_text, format_config, format_deploy_report_json,
    format_deploy_report_text, format_plan_json, format_plan_text, format_section_heading,
    format_tree_json, format_tree_text,
};
pub use route::RunContext;
