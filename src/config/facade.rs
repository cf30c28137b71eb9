//! Config loading facade: one entry point over defaults, files, and environment.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::LtiAppsConfig;
use config::{ConfigError, Environment, File};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Loads [`LtiAppsConfig`] from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load with full precedence: defaults < global file < workspace files < environment
    pub fn load(workspace_root: &Path) -> Result<LtiAppsConfig, ConfigError> {
        Self::load_with_env(workspace_root, None)
    }

    /// Like [`ConfigLoader::load`], reading environment overrides from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(
        workspace_root: &Path,
        env: Option<HashMap<String, String>>,
    ) -> Result<LtiAppsConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        builder
            .add_source(environment_source(env))
            .build()?
            .try_deserialize()
    }

    /// Load a single explicit file on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<LtiAppsConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}

/// `LTI_APPS__COLLECTION__BATCH_SIZE=20` style overrides
fn environment_source(env: Option<HashMap<String, String>>) -> Environment {
    Environment::with_prefix("LTI_APPS")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("features.lti2_rereg")
        .source(env)
}
