//! CLI presentation: text and json formatters per command family.

mod comparison;
mod deploy;
mod shared;

pub use comparison::{
    format_comparison_json, format_comparison_text, format_plan_json, format_plan_text,
};
pub use deploy::{format_deploy_report_json, format_deploy_report_text};
pub use shared::{format_config, format_section_heading, format_tree_json, format_tree_text};
