//! Tool Record Store
//!
//! Persistence-facing view of installed tools. Records are owned by an
//! installation flow elsewhere; the collator only reads them, scoped by
//! owning context and ordered by primary key.

pub mod persistence;

pub use persistence::SledToolStore;

use crate::error::StorageError;
use crate::types::{Context, ContextType, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool proxy lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolProxyState {
    #[default]
    Active,
    Disabled,
    Deleted,
}

/// Per-context enablement of a tool proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolProxyBinding {
    pub context_type: ContextType,
    pub context_id: RecordId,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ToolProxyBinding {
    pub fn for_context(context: &Context, enabled: bool) -> Self {
        Self {
            context_type: context.context_type,
            context_id: context.id,
            enabled,
        }
    }
}

/// An installed LTI 2.x integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolProxy {
    pub id: RecordId,
    pub context_type: ContextType,
    pub context_id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub workflow_state: ToolProxyState,
    /// Pending re-registration payload
    #[serde(default)]
    pub update_payload: Option<Value>,
    #[serde(default)]
    pub bindings: Vec<ToolProxyBinding>,
    /// Message handler used for re-registration launches
    #[serde(default)]
    pub reregistration_message_handler: Option<RecordId>,
}

impl ToolProxy {
    pub const LTI_VERSION: &'static str = "2.0";

    pub fn new(id: RecordId, context: &Context, name: impl Into<String>) -> Self {
        Self {
            id,
            context_type: context.context_type,
            context_id: context.id,
            name: name.into(),
            description: None,
            workflow_state: ToolProxyState::Active,
            update_payload: None,
            bindings: Vec::new(),
            reregistration_message_handler: None,
        }
    }

    /// Enabled iff some binding for `context` is not disabled
    pub fn enabled_for(&self, context: &Context) -> bool {
        self.bindings
            .iter()
            .any(|b| context.owns(b.context_type, b.context_id) && b.enabled)
    }

    /// Whether a non-blank update payload is waiting
    pub fn has_update_payload(&self) -> bool {
        self.update_payload.as_ref().is_some_and(is_present)
    }

    pub fn is_installed(&self) -> bool {
        self.workflow_state != ToolProxyState::Deleted
    }
}

/// External tool privacy/workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Public,
    Anonymous,
    NameOnly,
    EmailOnly,
    Disabled,
    Deleted,
}

/// An installed LTI 1.1 / 1.3 integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalTool {
    pub id: RecordId,
    pub context_type: ContextType,
    pub context_id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub use_1_3: bool,
    #[serde(default)]
    pub deployment_id: Option<String>,
    #[serde(default)]
    pub settings: serde_json::Map<String, Value>,
    #[serde(default)]
    pub workflow_state: WorkflowState,
}

impl ExternalTool {
    pub fn new(id: RecordId, context: &Context, name: impl Into<String>) -> Self {
        Self {
            id,
            context_type: context.context_type,
            context_id: context.id,
            name: name.into(),
            description: None,
            use_1_3: false,
            deployment_id: None,
            settings: serde_json::Map::new(),
            workflow_state: WorkflowState::Public,
        }
    }

    pub fn lti_version(&self) -> &'static str {
        if self.use_1_3 {
            "1.3"
        } else {
            "1.1"
        }
    }

    pub fn enabled(&self) -> bool {
        self.workflow_state != WorkflowState::Disabled
    }

    pub fn editor_button(&self) -> Option<&Value> {
        self.settings.get("editor_button")
    }

    pub fn is_installed(&self) -> bool {
        self.workflow_state != WorkflowState::Deleted
    }
}

/// Blank JSON (null, empty string/array/object) counts as absent
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Tool Record Store interface
///
/// Both scans return raw rows owned by `context` with `id >= from_id`, in
/// ascending id order, at most `limit` of them. Deleted rows are included.
pub trait ToolRecordStore: Send + Sync {
    fn tool_proxies(
        &self,
        context: &Context,
        from_id: RecordId,
        limit: usize,
    ) -> Result<Vec<ToolProxy>, StorageError>;

    fn external_tools(
        &self,
        context: &Context,
        from_id: RecordId,
        limit: usize,
    ) -> Result<Vec<ExternalTool>, StorageError>;
}
