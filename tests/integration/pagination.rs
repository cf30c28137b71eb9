//! Integration tests for merged bookmark pagination

use super::test_utils::{bound_proxy, collator, collator_with, collect_all, seeded_store};
use lti_apps::config::LtiAppsConfig;
use lti_apps::store::{ToolProxyState, WorkflowState};
use lti_apps::types::SourceTag;
use lti_apps::{CollatorError, Context, ExternalTool, SortKey};

fn three_and_three(context: &Context) -> (Vec<lti_apps::ToolProxy>, Vec<ExternalTool>) {
    let proxies = (1..=3)
        .map(|id| bound_proxy(id, context, &format!("proxy {}", id)))
        .collect();
    let tools = (11..=13)
        .map(|id| ExternalTool::new(id, context, format!("tool {}", id)))
        .collect();
    (proxies, tools)
}

#[test]
fn test_three_and_three_over_two_pages() {
    let account = Context::account(1);
    let (proxies, tools) = three_and_three(&account);
    let collator = collator(seeded_store(&proxies, &tools), account, false);
    let collection = collator.bookmarked_collection().unwrap();

    let first = collection.paginate(None, 3).unwrap();
    assert_eq!(first.len(), 3);
    let token = first.next_page().expect("first page should have a successor");

    let second = collection.paginate(Some(token), 3).unwrap();
    assert_eq!(second.len(), 3);
    assert!(second.next_page().is_none());
    assert_ne!(first.first(), second.first());

    let ids: Vec<_> = first.iter().chain(second.iter()).map(|r| r.id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 11, 12, 13]);
}

#[test]
fn test_interleaved_ids_merge_in_order() {
    let account = Context::account(1);
    let proxies: Vec<_> = [2, 5, 9, 14]
        .iter()
        .map(|id| bound_proxy(*id, &account, "p"))
        .collect();
    let tools: Vec<_> = [1, 5, 6, 10, 20]
        .iter()
        .map(|id| ExternalTool::new(*id, &account, "t"))
        .collect();
    let collator = collator(seeded_store(&proxies, &tools), account, false);
    let collection = collator.bookmarked_collection().unwrap();

    for per_page in 1..=10 {
        assert_eq!(
            collect_all(&collection, per_page),
            vec![
                (SourceTag::ExternalTools, 1),
                (SourceTag::ToolProxies, 2),
                (SourceTag::ToolProxies, 5),
                (SourceTag::ExternalTools, 5),
                (SourceTag::ExternalTools, 6),
                (SourceTag::ToolProxies, 9),
                (SourceTag::ExternalTools, 10),
                (SourceTag::ToolProxies, 14),
                (SourceTag::ExternalTools, 20),
            ],
            "per_page = {}",
            per_page
        );
    }
}

#[test]
fn test_name_sort_is_case_insensitive_with_source_tie_break() {
    let account = Context::account(1);
    let proxies = vec![
        bound_proxy(1, &account, "zeta"),
        bound_proxy(2, &account, "Alpha"),
    ];
    let tools = vec![
        ExternalTool::new(3, &account, "alpha"),
        ExternalTool::new(4, &account, "Beta"),
    ];
    let collator = collator(seeded_store(&proxies, &tools), account, false);
    let collection = collator
        .bookmarked_collection_sorted_by(SortKey::Name)
        .unwrap();

    assert_eq!(
        collect_all(&collection, 1),
        vec![
            (SourceTag::ToolProxies, 2),
            (SourceTag::ExternalTools, 3),
            (SourceTag::ExternalTools, 4),
            (SourceTag::ToolProxies, 1),
        ]
    );
}

#[test]
fn test_name_sort_pages_through_long_names() {
    let account = Context::account(1);
    let long_a = "x".repeat(2_100);
    let long_b = format!("{}y", long_a);
    let proxies = vec![
        bound_proxy(1, &account, &long_b),
        bound_proxy(2, &account, &long_a),
    ];
    let tools = vec![ExternalTool::new(3, &account, long_a.clone())];
    let collator = collator(seeded_store(&proxies, &tools), account, false);
    let collection = collator
        .bookmarked_collection_sorted_by(SortKey::Name)
        .unwrap();

    let first = collection.paginate(None, 1).unwrap();
    let token = first.next_page().unwrap();
    assert!(token.len() > 4_096);

    assert_eq!(
        collect_all(&collection, 1),
        vec![
            (SourceTag::ToolProxies, 2),
            (SourceTag::ExternalTools, 3),
            (SourceTag::ToolProxies, 1),
        ]
    );
}

#[test]
fn test_deleted_and_foreign_records_are_skipped() {
    let account = Context::account(1);
    let other = Context::account(2);
    let course = Context::course(7, 1);

    let mut deleted_proxy = bound_proxy(2, &account, "gone");
    deleted_proxy.workflow_state = ToolProxyState::Deleted;
    let mut deleted_tool = ExternalTool::new(4, &account, "gone");
    deleted_tool.workflow_state = WorkflowState::Deleted;
    let mut disabled_tool = ExternalTool::new(5, &account, "off");
    disabled_tool.workflow_state = WorkflowState::Disabled;

    let proxies = vec![
        bound_proxy(1, &account, "a"),
        deleted_proxy,
        bound_proxy(3, &other, "b"),
        bound_proxy(6, &course, "c"),
    ];
    let tools = vec![deleted_tool, disabled_tool, ExternalTool::new(8, &course, "d")];
    let collator = collator(seeded_store(&proxies, &tools), account, false);
    let collection = collator.bookmarked_collection().unwrap();

    assert_eq!(
        collect_all(&collection, 2),
        vec![(SourceTag::ToolProxies, 1), (SourceTag::ExternalTools, 5)]
    );
}

#[test]
fn test_per_page_is_clamped_to_configured_maximum() {
    let account = Context::account(1);
    let (proxies, tools) = three_and_three(&account);
    let mut config = LtiAppsConfig::default();
    config.collection.max_per_page = 4;
    config.collection.batch_size = 2;

    let collator = collator_with(seeded_store(&proxies, &tools), account, false, &config);
    let collection = collator.bookmarked_collection().unwrap();

    let first = collection.paginate(None, 50).unwrap();
    assert_eq!(first.len(), 4);
    let second = collection.paginate(first.next_page(), 50).unwrap();
    assert_eq!(second.len(), 2);
    assert!(second.next_page().is_none());
}

#[test]
fn test_zero_per_page_is_rejected() {
    let account = Context::account(1);
    let collator = collator(seeded_store(&[], &[]), account, false);
    let result = collator.bookmarked_collection().unwrap().paginate(None, 0);
    assert!(matches!(result, Err(CollatorError::InvalidArgument(_))));
}

#[test]
fn test_resume_reflects_writes_made_between_pages() {
    let account = Context::account(1);
    let (proxies, tools) = three_and_three(&account);
    let store = seeded_store(&proxies, &tools);
    let collator = collator(store.clone(), account, false);
    let collection = collator.bookmarked_collection().unwrap();

    let first = collection.paginate(None, 3).unwrap();
    let token = first.next_page().unwrap().to_string();

    // Behind the bookmark: never seen. Ahead of it: picked up.
    store.put_tool_proxy(&bound_proxy(0, &account, "late")).unwrap();
    store
        .put_external_tool(&ExternalTool::new(125, &account, "later"))
        .unwrap();
    store.delete_tool_proxy(3).unwrap();

    let second = collection.paginate(Some(&token), 10).unwrap();
    let ids: Vec<_> = second.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![11, 12, 13, 125]);
}

#[test]
fn test_empty_context_has_no_pages() {
    let collator = collator(seeded_store(&[], &[]), Context::course(3, 1), false);
    let collection = collator.bookmarked_collection().unwrap();

    let page = collection.paginate(None, 10).unwrap();
    assert!(page.is_empty());
    assert!(page.next_page().is_none());
    assert_eq!(collection.pages(10).count(), 1);
}
