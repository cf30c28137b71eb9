//! Import presentation: summary of records written to the store.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub file: PathBuf,
    pub tool_proxies: usize,
    pub external_tools: usize,
}

pub fn format_import_summary(summary: &ImportSummary) -> String {
    format!(
        "Imported {} from {}:\n  Tool proxies: {}\n  External tools: {}",
        plural(summary.tool_proxies + summary.external_tools, "record"),
        summary.file.display(),
        summary.tool_proxies,
        summary.external_tools
    )
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
