//! Integration tests for the CLI route table

use super::test_utils::with_xdg_env;
use lti_apps::cli::{Commands, RunContext};
use lti_apps::CollatorError;
use serde_json::{json, Value};
use tempfile::TempDir;

fn list(page: Option<String>, format: &str) -> Commands {
    Commands::List {
        context_type: "account".to_string(),
        context_id: 1,
        root_account_id: None,
        per_page: 2,
        page,
        sort: None,
        format: format.to_string(),
    }
}

fn write_import(workspace: &TempDir) -> std::path::PathBuf {
    let path = workspace.path().join("apps.json");
    let input = json!({
        "tool_proxies": [
            {"id": 1, "context_type": "Account", "context_id": 1, "name": "Proxy",
             "update_payload": {"one": 2}, "reregistration_message_handler": 8,
             "bindings": [{"context_type": "Account", "context_id": 1}]}
        ],
        "external_tools": [
            {"id": 2, "context_type": "Account", "context_id": 1, "name": "Tool A"},
            {"id": 3, "context_type": "Account", "context_id": 1, "name": "Tool B", "use_1_3": true}
        ]
    });
    std::fs::write(&path, serde_json::to_string(&input).unwrap()).unwrap();
    path
}

#[test]
fn test_import_then_page_through_json() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    let config_dir = workspace.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[features]\nlti2_rereg = [1]\n").unwrap();
    let file = write_import(&workspace);

    with_xdg_env(&xdg, || {
        let ctx = RunContext::new(workspace.path().to_path_buf(), None).unwrap();
        assert!(ctx.workspace_root().join(".lti-apps/store").exists());

        let summary = ctx.execute(&Commands::Import { file: file.clone() }).unwrap();
        assert!(summary.starts_with("Imported 3 records"));

        let first: Value = serde_json::from_str(&ctx.execute(&list(None, "json")).unwrap()).unwrap();
        assert_eq!(first["apps"].as_array().unwrap().len(), 2);
        assert_eq!(first["apps"][0]["app_type"], "Lti::ToolProxy");
        assert_eq!(first["apps"][0]["has_update"], true);
        assert_eq!(
            first["apps"][0]["reregistration_url"],
            "/accounts/1/lti/tool_proxy_reregistration/1"
        );
        let token = first["next_page"].as_str().unwrap().to_string();

        let second: Value =
            serde_json::from_str(&ctx.execute(&list(Some(token), "json")).unwrap()).unwrap();
        assert_eq!(second["apps"].as_array().unwrap().len(), 1);
        assert_eq!(second["apps"][0]["lti_version"], "1.3");
        assert!(second["next_page"].is_null());
    });
}

#[test]
fn test_list_text_and_errors() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    let file = write_import(&workspace);

    with_xdg_env(&xdg, || {
        let ctx = RunContext::new(workspace.path().to_path_buf(), None).unwrap();
        ctx.execute(&Commands::Import { file: file.clone() }).unwrap();

        let text = ctx.execute(&list(None, "text")).unwrap();
        assert!(text.contains("Tool A"));
        assert!(text.contains("Next page: --page "));

        assert!(matches!(
            ctx.execute(&list(Some("not-a-token".to_string()), "text")),
            Err(CollatorError::InvalidBookmark(_))
        ));
        assert!(matches!(
            ctx.execute(&list(None, "yaml")),
            Err(CollatorError::InvalidArgument(_))
        ));
        assert!(matches!(
            ctx.execute(&Commands::Import {
                file: workspace.path().join("missing.json")
            }),
            Err(CollatorError::StorageError(_))
        ));
    });
}
