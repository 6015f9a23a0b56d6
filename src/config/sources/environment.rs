//! Environment variable source: WOOD__* with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `WOOD__SYNC__MAX_CONCURRENT=4` sets `sync.max_concurrent`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("WOOD")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
