//! Definition Projector
//!
//! Maps a [`SourceRecord`] to the normalized app definition served by the
//! apps API. Each source has its own output struct; fields that only make
//! sense for external tools live only on that struct, so they are absent,
//! not null, on tool proxy definitions.

use crate::error::CollatorError;
use crate::features::{Feature, FeatureFlags};
use crate::source::SourceRecord;
use crate::store::{ExternalTool, ToolProxy};
use crate::types::{Context, ContextType, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Builds re-registration launch URLs for tool proxies
pub trait ReregistrationUrlBuilder: Send + Sync {
    fn reregistration_url(
        &self,
        context: &Context,
        tool_proxy_id: RecordId,
    ) -> anyhow::Result<String>;
}

/// URL builder that fills a path template
#[derive(Debug, Clone)]
pub struct TemplateUrlBuilder {
    template: String,
}

impl TemplateUrlBuilder {
    pub fn new(template: impl Into<String>) -> Result<Self, CollatorError> {
        let template = template.into();
        if !template.contains("{tool_proxy_id}") {
            return Err(CollatorError::ConfigError(format!(
                "reregistration url template '{}' must contain {{tool_proxy_id}}",
                template
            )));
        }
        Ok(Self { template })
    }
}

impl ReregistrationUrlBuilder for TemplateUrlBuilder {
    fn reregistration_url(
        &self,
        context: &Context,
        tool_proxy_id: RecordId,
    ) -> anyhow::Result<String> {
        Ok(self
            .template
            .replace("{context_type}", context.context_type.route_segment())
            .replace("{context_id}", &context.id.to_string())
            .replace("{tool_proxy_id}", &tool_proxy_id.to_string()))
    }
}

/// Wire tag naming the record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppType {
    #[serde(rename = "Lti::ToolProxy")]
    ToolProxy,
    #[serde(rename = "ContextExternalTool")]
    ExternalTool,
}

/// Fields every app definition carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDefinitionBase {
    pub app_type: AppType,
    pub context: ContextType,
    pub context_id: RecordId,
    pub app_id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub installed_locally: bool,
    pub has_update: Option<bool>,
    pub enabled: bool,
    pub tool_configuration: Option<Value>,
    pub reregistration_url: Option<String>,
    pub lti_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolProxyDefinition {
    #[serde(flatten)]
    pub base: AppDefinitionBase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalToolDefinition {
    #[serde(flatten)]
    pub base: AppDefinitionBase,
    pub deployment_id: Option<String>,
    pub editor_button_settings: Option<Value>,
}

/// Normalized, source-agnostic app definition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AppDefinition {
    ToolProxy(ToolProxyDefinition),
    ExternalTool(ExternalToolDefinition),
}

impl AppDefinition {
    pub fn base(&self) -> &AppDefinitionBase {
        match self {
            AppDefinition::ToolProxy(def) => &def.base,
            AppDefinition::ExternalTool(def) => &def.base,
        }
    }

    pub fn app_type(&self) -> AppType {
        self.base().app_type
    }
}

/// Pure mapping from source records to app definitions
#[derive(Clone)]
pub struct DefinitionProjector {
    features: Arc<dyn FeatureFlags>,
    url_builder: Arc<dyn ReregistrationUrlBuilder>,
}

impl DefinitionProjector {
    pub fn new(
        features: Arc<dyn FeatureFlags>,
        url_builder: Arc<dyn ReregistrationUrlBuilder>,
    ) -> Self {
        Self {
            features,
            url_builder,
        }
    }

    pub fn project(
        &self,
        context: &Context,
        record: &SourceRecord,
    ) -> Result<AppDefinition, CollatorError> {
        match record {
            SourceRecord::ToolProxy(proxy) => self
                .tool_proxy_definition(context, proxy)
                .map(AppDefinition::ToolProxy),
            SourceRecord::ExternalTool(tool) => Ok(AppDefinition::ExternalTool(
                external_tool_definition(tool),
            )),
        }
    }

    fn tool_proxy_definition(
        &self,
        context: &Context,
        proxy: &ToolProxy,
    ) -> Result<ToolProxyDefinition, CollatorError> {
        let rereg_enabled = self
            .features
            .feature_enabled(Feature::Lti2Rereg, &context.root_account());

        let has_update = rereg_enabled.then(|| proxy.has_update_payload());
        let reregistration_url = if rereg_enabled && proxy.reregistration_message_handler.is_some() {
            Some(
                self.url_builder
                    .reregistration_url(context, proxy.id)
                    .map_err(CollatorError::UrlBuilder)?,
            )
        } else {
            None
        };
        debug!(
            tool_proxy = proxy.id,
            rereg_enabled,
            has_update = ?has_update,
            "Projected tool proxy"
        );

        Ok(ToolProxyDefinition {
            base: AppDefinitionBase {
                app_type: AppType::ToolProxy,
                context: proxy.context_type,
                context_id: proxy.context_id,
                app_id: proxy.id,
                name: proxy.name.clone(),
                description: proxy.description.clone(),
                installed_locally: true,
                has_update,
                enabled: proxy.enabled_for(context),
                tool_configuration: None,
                reregistration_url,
                lti_version: ToolProxy::LTI_VERSION.to_string(),
            },
        })
    }
}

fn external_tool_definition(tool: &ExternalTool) -> ExternalToolDefinition {
    ExternalToolDefinition {
        base: AppDefinitionBase {
            app_type: AppType::ExternalTool,
            context: tool.context_type,
            context_id: tool.context_id,
            app_id: tool.id,
            name: tool.name.clone(),
            description: tool.description.clone(),
            installed_locally: true,
            has_update: None,
            enabled: tool.enabled(),
            tool_configuration: None,
            reregistration_url: None,
            lti_version: tool.lti_version().to_string(),
        },
        deployment_id: tool.deployment_id.clone(),
        editor_button_settings: tool.editor_button().cloned(),
    }
}
