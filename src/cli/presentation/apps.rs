//! App list presentation: one page of definitions plus its next-page token.

use crate::definition::{AppDefinition, AppType};
use crate::error::CollatorError;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;

pub fn format_app_list_text(definitions: &[AppDefinition], next_page: Option<&str>) -> String {
    if definitions.is_empty() {
        return "No apps installed in this context.".to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["App ID", "Type", "Name", "LTI", "Enabled", "Update"]);
    for definition in definitions {
        let base = definition.base();
        let app_type = match base.app_type {
            AppType::ToolProxy => "tool proxy",
            AppType::ExternalTool => "external tool",
        };
        let update = match base.has_update {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };
        let enabled = if base.enabled { "yes" } else { "no" };
        table.add_row(vec![
            base.app_id.to_string(),
            app_type.to_string(),
            base.name.clone(),
            base.lti_version.clone(),
            enabled.to_string(),
            update.to_string(),
        ]);
    }

    let mut out = table.to_string();
    match next_page {
        Some(token) => out.push_str(&format!("\n\nNext page: --page {}", token)),
        None => out.push_str("\n\nEnd of list."),
    }
    out
}

pub fn format_app_list_json(
    definitions: &[AppDefinition],
    next_page: Option<&str>,
) -> Result<String, CollatorError> {
    let out = json!({
        "apps": definitions,
        "next_page": next_page,
    });
    serde_json::to_string_pretty(&out)
        .map_err(|e| CollatorError::InvalidArgument(format!("Failed to render json: {}", e)))
}
