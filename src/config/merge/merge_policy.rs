//! Merge rules: built-in defaults applied beneath every other source.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("invalidation.collapse_threshold", 0.5)?
        .set_default("invalidation.min_changed_children", 2_i64)?
        .set_default("invalidation.include_added", false)?
        .set_default("invalidation.max_patterns_per_request", 1000_i64)?
        .set_default("invalidation.max_concurrent", 1_i64)?
        .set_default("sync.max_concurrent", 8_i64)?
        .set_default("deploy.ordering", "sequential")?
        .set_default("deploy.dry_run", false)
}
