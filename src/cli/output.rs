//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::CollatorError;

/// Map collator errors to a string for CLI output.
/// Bookmark and scope problems get a hint; everything else prints as is.
pub fn map_error(e: &CollatorError) -> String {
    match e {
        CollatorError::InvalidBookmark(_) => {
            format!("{}\nhint: restart from the first page by omitting --page", e)
        }
        CollatorError::InvalidScope(_) => format!(
            "{}\nhint: --context-id and --root-account-id must be positive",
            e
        ),
        _ => e.to_string(),
    }
}
