//! CLI presentation: text and json formatters per command.

mod apps;
mod import;

pub use apps::{format_app_list_json, format_app_list_text};
pub use import::{format_import_summary, ImportSummary};
