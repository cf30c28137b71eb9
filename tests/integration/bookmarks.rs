//! Integration tests for bookmark tokens as seen by callers

use super::test_utils::{bound_proxy, collator, collator_with, seeded_store};
use lti_apps::bookmark::{Bookmark, BookmarkCodec};
use lti_apps::config::LtiAppsConfig;
use lti_apps::{CollatorError, Context, ExternalTool, SortKey};

fn two_page_setup(context: &Context) -> (Vec<lti_apps::ToolProxy>, Vec<ExternalTool>) {
    (
        vec![bound_proxy(1, context, "a"), bound_proxy(2, context, "b")],
        vec![ExternalTool::new(3, context, "c")],
    )
}

fn first_token(context: Context, sort_key: SortKey) -> String {
    let (proxies, tools) = two_page_setup(&context);
    let collator = collator(seeded_store(&proxies, &tools), context, false);
    collator
        .bookmarked_collection_sorted_by(sort_key)
        .unwrap()
        .paginate(None, 1)
        .unwrap()
        .next_page()
        .unwrap()
        .to_string()
}

fn is_invalid_bookmark<T: std::fmt::Debug>(result: Result<T, CollatorError>) -> bool {
    matches!(result, Err(CollatorError::InvalidBookmark(_)))
}

#[test]
fn test_tampered_token_is_rejected() {
    let account = Context::account(1);
    let token = first_token(account, SortKey::Id);
    let (proxies, tools) = two_page_setup(&account);
    let collection = collator(seeded_store(&proxies, &tools), account, false)
        .bookmarked_collection()
        .unwrap();

    let mut bytes = token.into_bytes();
    let last = bytes.len() - 1;
    bytes[last] = if bytes[last] == b'0' { b'1' } else { b'0' };
    let tampered = String::from_utf8(bytes).unwrap();

    assert!(is_invalid_bookmark(collection.paginate(Some(&tampered), 1)));
    assert!(is_invalid_bookmark(collection.paginate(Some("zz"), 1)));
    assert!(is_invalid_bookmark(collection.paginate(Some(""), 1)));
}

#[test]
fn test_token_from_another_context_is_rejected() {
    let token = first_token(Context::account(1), SortKey::Id);
    let other = Context::account(2);
    let (proxies, tools) = two_page_setup(&other);
    let collection = collator(seeded_store(&proxies, &tools), other, false)
        .bookmarked_collection()
        .unwrap();

    assert!(is_invalid_bookmark(collection.paginate(Some(&token), 1)));
}

#[test]
fn test_token_from_another_sort_is_rejected() {
    let account = Context::account(1);
    let token = first_token(account, SortKey::Name);
    let (proxies, tools) = two_page_setup(&account);
    let collection = collator(seeded_store(&proxies, &tools), account, false)
        .bookmarked_collection_sorted_by(SortKey::Id)
        .unwrap();

    assert!(is_invalid_bookmark(collection.paginate(Some(&token), 1)));
}

#[test]
fn test_token_signed_with_another_secret_is_rejected() {
    let account = Context::account(1);
    let token = first_token(account, SortKey::Id);

    let mut config = LtiAppsConfig::default();
    config.bookmarks.secret = "rotated".to_string();
    let (proxies, tools) = two_page_setup(&account);
    let collection = collator_with(seeded_store(&proxies, &tools), account, false, &config)
        .bookmarked_collection()
        .unwrap();

    assert!(is_invalid_bookmark(collection.paginate(Some(&token), 1)));
}

#[test]
fn test_tokens_survive_a_new_collator_instance() {
    let account = Context::account(1);
    let token = first_token(account, SortKey::Id);
    let (proxies, tools) = two_page_setup(&account);
    let collection = collator(seeded_store(&proxies, &tools), account, false)
        .bookmarked_collection()
        .unwrap();

    let page = collection.paginate(Some(&token), 5).unwrap();
    let ids: Vec<_> = page.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn test_decoded_bookmark_names_last_record() {
    let account = Context::account(1);
    let (proxies, tools) = two_page_setup(&account);
    let collection = collator(seeded_store(&proxies, &tools), account, false)
        .bookmarked_collection_sorted_by(SortKey::Name)
        .unwrap();
    let codec = BookmarkCodec::from_secret(&LtiAppsConfig::default().bookmarks.secret);

    let mut token = None;
    loop {
        let page = collection.paginate(token.as_deref(), 1).unwrap();
        let Some(next) = page.next_page() else {
            break;
        };
        let record = page.first().unwrap();
        let bookmark: Bookmark = codec.decode(collection.identity(), next).unwrap();
        assert_eq!(bookmark.source, record.source());
        assert_eq!(bookmark.id, record.id());
        assert_eq!(bookmark.value, record.sort_value(SortKey::Name));
        token = Some(next.to_string());
    }
}
