//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("collection.default_sort", "id")?
        .set_default("collection.batch_size", 50)?
        .set_default("collection.max_per_page", 100)?
        .set_default("storage.store_path", ".lti-apps/store")
}
