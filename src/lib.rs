//! LTI Apps: collation of installed LTI tools
//!
//! Merges the tool proxies and external tools installed in an owning context
//! into one bookmark-paginated feed, and projects each record into a
//! normalized app definition.

pub mod bookmark;
pub mod cli;
pub mod collator;
pub mod collection;
pub mod config;
pub mod definition;
pub mod error;
pub mod features;
pub mod logging;
pub mod source;
pub mod store;
pub mod types;

pub use collator::{AppCollator, CollatorSettings};
pub use collection::{MergedCollection, Page};
pub use definition::{AppDefinition, ReregistrationUrlBuilder, TemplateUrlBuilder};
pub use error::{CollatorError, StorageError};
pub use features::{Feature, FeatureFlags, StaticFeatureFlags};
pub use source::SourceRecord;
pub use store::{ExternalTool, SledToolStore, ToolProxy, ToolRecordStore};
pub use types::{Context, ContextType, RecordId, SortKey};
