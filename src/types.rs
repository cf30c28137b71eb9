//! Shared identifiers for owning contexts, records, and sort positions.

use crate::error::CollatorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primary key of a persisted record (tool proxy, external tool, account, course)
pub type RecordId = u64;

/// Kind of scope a tool installation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContextType {
    Account,
    Course,
}

impl ContextType {
    /// Single-byte tag used in storage keys and fingerprints
    pub fn tag_byte(self) -> u8 {
        match self {
            ContextType::Account => b'A',
            ContextType::Course => b'C',
        }
    }

    /// Plural route segment (`accounts`, `courses`)
    pub fn route_segment(self) -> &'static str {
        match self {
            ContextType::Account => "accounts",
            ContextType::Course => "courses",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContextType::Account => "Account",
            ContextType::Course => "Course",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextType {
    type Err = CollatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "account" => Ok(ContextType::Account),
            "course" => Ok(ContextType::Course),
            other => Err(CollatorError::InvalidScope(format!(
                "unknown context type '{}'",
                other
            ))),
        }
    }
}

/// Owning context: the scope a tool is installed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Context {
    pub context_type: ContextType,
    pub id: RecordId,
    /// Root account of the context's account chain; feature flags resolve here
    pub root_account_id: RecordId,
}

impl Context {
    /// A root account is its own root
    pub fn account(id: RecordId) -> Self {
        Self {
            context_type: ContextType::Account,
            id,
            root_account_id: id,
        }
    }

    pub fn course(id: RecordId, root_account_id: RecordId) -> Self {
        Self {
            context_type: ContextType::Course,
            id,
            root_account_id,
        }
    }

    /// The root account scope used for feature-flag lookups
    pub fn root_account(&self) -> Context {
        Context::account(self.root_account_id)
    }

    /// Reject contexts that cannot identify a persisted scope
    pub fn validate(&self) -> Result<(), CollatorError> {
        if self.id == 0 {
            return Err(CollatorError::InvalidScope(format!(
                "{} id must be non-zero",
                self.context_type
            )));
        }
        if self.root_account_id == 0 {
            return Err(CollatorError::InvalidScope(format!(
                "{} {} has no root account",
                self.context_type, self.id
            )));
        }
        Ok(())
    }

    /// Whether a record stamped with `(context_type, context_id)` belongs here
    pub fn owns(&self, context_type: ContextType, context_id: RecordId) -> bool {
        self.context_type == context_type && self.id == context_id
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.context_type, self.id)
    }
}

/// Which backing collection a record came from.
///
/// Declaration order is merge precedence on equal sort values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceTag {
    ToolProxies,
    ExternalTools,
}

impl SourceTag {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceTag::ToolProxies => "tool_proxies",
            SourceTag::ExternalTools => "external_tools",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key a collection is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Primary key ascending
    #[default]
    Id,
    /// Case-folded name, then primary key
    Name,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Name => "name",
        }
    }

    /// Sort value of a record with the given primary key and name
    pub fn value_for(self, id: RecordId, name: &str) -> SortValue {
        match self {
            SortKey::Id => SortValue::Id(id),
            SortKey::Name => SortValue::for_name(name),
        }
    }

    /// Whether `value` was produced under this sort key
    pub fn accepts(self, value: &SortValue) -> bool {
        matches!(
            (self, value),
            (SortKey::Id, SortValue::Id(_)) | (SortKey::Name, SortValue::Name(_))
        )
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = CollatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(SortKey::Id),
            "name" => Ok(SortKey::Name),
            other => Err(CollatorError::InvalidArgument(format!(
                "unknown sort key '{}' (expected 'id' or 'name')",
                other
            ))),
        }
    }
}

/// Comparable sort value extracted from a record.
///
/// A collection only ever holds one variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SortValue {
    Id(RecordId),
    Name(String),
}

impl SortValue {
    /// Collation key for name ordering
    pub fn for_name(name: &str) -> Self {
        SortValue::Name(name.to_lowercase())
    }
}

/// A position in one source's `(sort_value, id)` order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub value: SortValue,
    pub id: RecordId,
}

impl SourcePosition {
    pub fn new(value: SortValue, id: RecordId) -> Self {
        Self { value, id }
    }

    /// Whether a record at `(value, id)` lies after this position
    /// (or at it, when `include` is set)
    pub fn admits(&self, value: &SortValue, id: RecordId, include: bool) -> bool {
        match (value, id).cmp(&(&self.value, self.id)) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Equal => include,
            std::cmp::Ordering::Less => false,
        }
    }
}
