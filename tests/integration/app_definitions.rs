//! Integration tests for app definition projection

use super::test_utils::{bound_proxy, collator, seeded_store};
use lti_apps::config::DEFAULT_REREGISTRATION_TEMPLATE;
use lti_apps::definition::AppType;
use lti_apps::store::ToolProxyBinding;
use lti_apps::{
    AppCollator, AppDefinition, CollatorSettings, Context, ExternalTool, Feature, SourceRecord,
    StaticFeatureFlags, TemplateUrlBuilder,
};
use serde_json::json;
use std::sync::Arc;

fn proxy_with_update(context: &Context) -> lti_apps::ToolProxy {
    let mut proxy = bound_proxy(1, context, "Proxy");
    proxy.update_payload = Some(json!({"one": 2}));
    proxy.reregistration_message_handler = Some(40);
    proxy
}

fn only_definition(collator: &AppCollator) -> AppDefinition {
    let page = collator
        .bookmarked_collection()
        .unwrap()
        .paginate(None, 10)
        .unwrap();
    let mut definitions = collator.app_definitions(page.records()).unwrap();
    assert_eq!(definitions.len(), 1);
    definitions.remove(0)
}

#[test]
fn test_update_payload_with_flag_on() {
    let account = Context::account(1);
    let store = seeded_store(&[proxy_with_update(&account)], &[]);
    let definition = only_definition(&collator(store, account, true));

    assert_eq!(definition.app_type(), AppType::ToolProxy);
    assert_eq!(definition.base().has_update, Some(true));
    assert_eq!(
        definition.base().reregistration_url.as_deref(),
        Some("mock_url")
    );
}

#[test]
fn test_update_payload_with_flag_off() {
    let account = Context::account(1);
    let store = seeded_store(&[proxy_with_update(&account)], &[]);
    let definition = only_definition(&collator(store, account, false));

    let value = serde_json::to_value(&definition).unwrap();
    assert!(value["has_update"].is_null());
    assert!(value["reregistration_url"].is_null());
}

#[test]
fn test_flag_on_without_payload_or_handler() {
    let account = Context::account(1);
    let store = seeded_store(&[bound_proxy(1, &account, "Proxy")], &[]);
    let definition = only_definition(&collator(store, account, true));

    assert_eq!(definition.base().has_update, Some(false));
    assert_eq!(definition.base().reregistration_url, None);
}

#[test]
fn test_lti_version_follows_use_1_3() {
    let account = Context::account(1);
    let mut modern = ExternalTool::new(2, &account, "modern");
    modern.use_1_3 = true;
    let legacy = ExternalTool::new(3, &account, "legacy");
    let store = seeded_store(&[], &[modern, legacy]);

    let collator = collator(store, account, false);
    let page = collator
        .bookmarked_collection()
        .unwrap()
        .paginate(None, 10)
        .unwrap();
    let versions: Vec<_> = collator
        .app_definitions(page.records())
        .unwrap()
        .iter()
        .map(|d| d.base().lti_version.clone())
        .collect();
    assert_eq!(versions, vec!["1.3", "1.1"]);
}

#[test]
fn test_tool_proxy_definitions_omit_external_tool_keys() {
    let account = Context::account(1);
    let mut tool = ExternalTool::new(2, &account, "tool");
    tool.deployment_id = Some("2:xyz".to_string());
    let store = seeded_store(&[bound_proxy(1, &account, "proxy")], &[tool]);

    let collator = collator(store, account, false);
    let page = collator
        .bookmarked_collection()
        .unwrap()
        .paginate(None, 10)
        .unwrap();
    let values: Vec<serde_json::Value> = collator
        .app_definitions(page.records())
        .unwrap()
        .iter()
        .map(|d| serde_json::to_value(d).unwrap())
        .collect();

    let proxy = values[0].as_object().unwrap();
    assert!(!proxy.contains_key("deployment_id"));
    assert!(!proxy.contains_key("editor_button_settings"));

    let tool = values[1].as_object().unwrap();
    assert_eq!(tool["deployment_id"], "2:xyz");
    assert!(tool.contains_key("editor_button_settings"));
    assert_eq!(tool["app_type"], "ContextExternalTool");
}

#[test]
fn test_enabled_follows_binding_for_this_context() {
    let course = Context::course(5, 1);
    let mut proxy = lti_apps::ToolProxy::new(1, &course, "proxy");
    proxy
        .bindings
        .push(ToolProxyBinding::for_context(&Context::account(1), true));
    proxy
        .bindings
        .push(ToolProxyBinding::for_context(&course, false));
    let store = seeded_store(&[proxy], &[]);

    let definition = only_definition(&collator(store, course, false));
    assert!(!definition.base().enabled);
    assert_eq!(definition.base().context_id, 5);
}

#[test]
fn test_projection_is_idempotent() {
    let account = Context::account(1);
    let store = seeded_store(
        &[proxy_with_update(&account)],
        &[ExternalTool::new(9, &account, "tool")],
    );
    let collator = collator(store, account, true);
    let records = collator
        .bookmarked_collection()
        .unwrap()
        .paginate(None, 10)
        .unwrap()
        .into_records();

    let first = collator.app_definitions(&records).unwrap();
    let second = collator.app_definitions(&records).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_definitions_keep_input_order() {
    let account = Context::account(1);
    let collator = collator(seeded_store(&[], &[]), account, false);
    let records = vec![
        SourceRecord::ExternalTool(ExternalTool::new(9, &account, "b")),
        SourceRecord::ToolProxy(bound_proxy(1, &account, "a")),
    ];

    let ids: Vec<_> = collator
        .app_definitions(&records)
        .unwrap()
        .iter()
        .map(|d| d.base().app_id)
        .collect();
    assert_eq!(ids, vec![9, 1]);
    assert!(collator.app_definitions(&[]).unwrap().is_empty());
}

#[test]
fn test_template_url_for_course_context() {
    let course = Context::course(4, 1);
    let flags = StaticFeatureFlags::new();
    flags.enable(Feature::Lti2Rereg, &Context::account(1));
    let mut proxy = bound_proxy(12, &course, "proxy");
    proxy.reregistration_message_handler = Some(3);

    let collator = AppCollator::new(
        course,
        seeded_store(&[proxy], &[]),
        Arc::new(flags),
        Arc::new(TemplateUrlBuilder::new(DEFAULT_REREGISTRATION_TEMPLATE).unwrap()),
        CollatorSettings::from_config(&Default::default()),
    )
    .unwrap();

    let definition = only_definition(&collator);
    assert_eq!(
        definition.base().reregistration_url.as_deref(),
        Some("/courses/4/lti/tool_proxy_reregistration/12")
    );
}
