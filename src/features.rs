//! Feature flag lookup
//!
//! The collator only asks one question of the flag system: is a feature on
//! for a scope. Scopes are root accounts in practice.

use crate::config::FeatureConfig;
use crate::error::CollatorError;
use crate::types::Context;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Features consulted during projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// LTI 2 tool proxy re-registration
    Lti2Rereg,
}

impl Feature {
    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Lti2Rereg => "lti2_rereg",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = CollatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "lti2_rereg" => Ok(Feature::Lti2Rereg),
            other => Err(CollatorError::InvalidArgument(format!(
                "unknown feature '{}'",
                other
            ))),
        }
    }
}

/// Feature flag lookup interface
pub trait FeatureFlags: Send + Sync {
    fn feature_enabled(&self, feature: Feature, scope: &Context) -> bool;
}

/// In-memory flag set keyed by `(feature, scope)`
#[derive(Debug, Default)]
pub struct StaticFeatureFlags {
    enabled: RwLock<HashSet<(Feature, Context)>>,
}

impl StaticFeatureFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags listed per root account in configuration
    pub fn from_config(config: &FeatureConfig) -> Self {
        let flags = Self::new();
        for account_id in &config.lti2_rereg {
            flags.enable(Feature::Lti2Rereg, &Context::account(*account_id));
        }
        flags
    }

    pub fn enable(&self, feature: Feature, scope: &Context) {
        self.enabled.write().insert((feature, *scope));
    }

    pub fn disable(&self, feature: Feature, scope: &Context) {
        self.enabled.write().remove(&(feature, *scope));
    }
}

impl FeatureFlags for StaticFeatureFlags {
    fn feature_enabled(&self, feature: Feature, scope: &Context) -> bool {
        self.enabled.read().contains(&(feature, *scope))
    }
}
