//! Configuration System
//!
//! Layered configuration for the collator: built-in defaults, a global user
//! file, workspace files, then `LTI_APPS__*` environment variables. Values are
//! validated after merging so a bad override is reported with its section.

use crate::error::CollatorError;
use crate::logging::LoggingConfig;
use crate::types::{RecordId, SortKey};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Placeholder secret; deployments are expected to override it
pub const DEFAULT_BOOKMARK_SECRET: &str = "lti-apps-development-bookmark-secret";

pub const DEFAULT_REREGISTRATION_TEMPLATE: &str =
    "/{context_type}/{context_id}/lti/tool_proxy_reregistration/{tool_proxy_id}";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LtiAppsConfig {
    /// Pagination behavior
    #[serde(default)]
    pub collection: CollectionConfig,

    /// Bookmark signing
    #[serde(default)]
    pub bookmarks: BookmarkConfig,

    /// Re-registration URL policy
    #[serde(default)]
    pub reregistration: ReregistrationConfig,

    /// Statically enabled features
    #[serde(default)]
    pub features: FeatureConfig,

    /// Storage paths
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Sort applied by `AppCollator::bookmarked_collection`
    #[serde(default)]
    pub default_sort: SortKey,

    /// Largest sub-batch pulled from one source per refill
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Page sizes above this are clamped
    #[serde(default = "default_max_per_page")]
    pub max_per_page: usize,
}

fn default_batch_size() -> usize {
    50
}

fn default_max_per_page() -> usize {
    100
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            default_sort: SortKey::default(),
            batch_size: default_batch_size(),
            max_per_page: default_max_per_page(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkConfig {
    #[serde(default = "default_secret")]
    pub secret: String,
}

fn default_secret() -> String {
    DEFAULT_BOOKMARK_SECRET.to_string()
}

impl Default for BookmarkConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
        }
    }
}

impl BookmarkConfig {
    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_BOOKMARK_SECRET
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReregistrationConfig {
    /// Supports `{context_type}`, `{context_id}` and `{tool_proxy_id}`
    #[serde(default = "default_url_template")]
    pub url_template: String,
}

fn default_url_template() -> String {
    DEFAULT_REREGISTRATION_TEMPLATE.to_string()
}

impl Default for ReregistrationConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
        }
    }
}

/// Root account ids per feature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default)]
    pub lti2_rereg: Vec<RecordId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".lti-apps/store")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Collection(String),
    Bookmarks(String),
    Reregistration(String),
    Storage(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Collection(msg) => write!(f, "collection: {}", msg),
            ValidationError::Bookmarks(msg) => write!(f, "bookmarks: {}", msg),
            ValidationError::Reregistration(msg) => write!(f, "reregistration: {}", msg),
            ValidationError::Storage(msg) => write!(f, "storage: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl LtiAppsConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.collection.batch_size == 0 {
            errors.push(ValidationError::Collection(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.collection.max_per_page == 0 {
            errors.push(ValidationError::Collection(
                "max_per_page must be positive".to_string(),
            ));
        }

        if self.bookmarks.secret.trim().is_empty() {
            errors.push(ValidationError::Bookmarks(
                "secret cannot be empty".to_string(),
            ));
        }

        if !self.reregistration.url_template.contains("{tool_proxy_id}") {
            errors.push(ValidationError::Reregistration(format!(
                "url_template '{}' must contain {{tool_proxy_id}}",
                self.reregistration.url_template
            )));
        }

        if self.storage.store_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "store_path cannot be empty".to_string(),
            ));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all problems into one error
    pub fn ensure_valid(&self) -> Result<(), CollatorError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            CollatorError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }
}
