use super::*;
use crate::application::usecases::testing::{
    ScriptedGraphql, comments_page, pr, thread, threads_page,
};

fn fetcher(graphql: &ScriptedGraphql) -> ThreadStateFetcher<'_> {
    ThreadStateFetcher::new(graphql, PageSizes::default())
}

#[tokio::test]
async fn single_page_maps_every_comment_to_its_thread_flag() {
    let mut graphql = ScriptedGraphql::default();
    graphql.thread_pages.insert(
        None,
        threads_page(
            vec![
                thread("T_a", true, &[1, 2], None),
                thread("T_b", false, &[3], None),
            ],
            None,
        ),
    );

    let states = fetcher(&graphql)
        .get_all_thread_states(&CallContext::new(), &pr())
        .await
        .unwrap();

    assert_eq!(states.len(), 3);
    assert_eq!(states[&1], true);
    assert_eq!(states[&2], true);
    assert_eq!(states[&3], false);
    assert_eq!(graphql.call_count(), 1);
}

#[tokio::test]
async fn follows_thread_list_cursor() {
    let mut graphql = ScriptedGraphql::default();
    graphql.thread_pages.insert(
        None,
        threads_page(vec![thread("T_a", true, &[1], None)], Some("page2")),
    );
    graphql.thread_pages.insert(
        Some("page2".to_string()),
        threads_page(vec![thread("T_b", false, &[2], None)], None),
    );

    let states = fetcher(&graphql)
        .get_all_thread_states(&CallContext::new(), &pr())
        .await
        .unwrap();

    assert_eq!(states, HashMap::from([(1, true), (2, false)]));
    assert_eq!(graphql.call_count(), 2);
}

#[tokio::test]
async fn per_thread_comment_pagination_stays_isolated() {
    let mut graphql = ScriptedGraphql::default();
    graphql.thread_pages.insert(
        None,
        threads_page(
            vec![
                thread("T_a", true, &[1, 2], Some("a-c1")),
                thread("T_b", false, &[3, 4], Some("b-c1")),
            ],
            None,
        ),
    );
    graphql.comment_pages.insert(
        ("T_a".to_string(), "a-c1".to_string()),
        comments_page("T_a", &[5], None),
    );
    graphql.comment_pages.insert(
        ("T_b".to_string(), "b-c1".to_string()),
        comments_page("T_b", &[6], None),
    );

    let states = fetcher(&graphql)
        .get_all_thread_states(&CallContext::new(), &pr())
        .await
        .unwrap();

    assert_eq!(
        states,
        HashMap::from([(1, true), (2, true), (5, true), (3, false), (4, false), (6, false)])
    );

    // 1 + T 이내의 왕복, 스레드 B 조회에 A의 커서를 쓰지 않는다.
    let calls = graphql.recorded();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1]["threadId"], "T_a");
    assert_eq!(calls[1]["after"], "a-c1");
    assert_eq!(calls[2]["threadId"], "T_b");
    assert_eq!(calls[2]["after"], "b-c1");
}

#[tokio::test]
async fn multi_page_thread_comments_advance_their_own_cursor() {
    let mut graphql = ScriptedGraphql::default();
    graphql.thread_pages.insert(
        None,
        threads_page(vec![thread("T_a", false, &[1], Some("c1"))], None),
    );
    graphql.comment_pages.insert(
        ("T_a".to_string(), "c1".to_string()),
        comments_page("T_a", &[2], Some("c2")),
    );
    graphql.comment_pages.insert(
        ("T_a".to_string(), "c2".to_string()),
        comments_page("T_a", &[3], None),
    );

    let states = fetcher(&graphql)
        .get_all_thread_states(&CallContext::new(), &pr())
        .await
        .unwrap();

    assert_eq!(states, HashMap::from([(1, false), (2, false), (3, false)]));
    assert_eq!(graphql.call_count(), 3);
}

#[tokio::test]
async fn graphql_errors_abort_without_partial_map() {
    let mut graphql = ScriptedGraphql::default();
    graphql.errors.push("rate limited".to_string());

    let err = fetcher(&graphql)
        .get_all_thread_states(&CallContext::new(), &pr())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::Remote { messages }) if messages == &["rate limited".to_string()]
    ));
}

#[tokio::test]
async fn vanished_thread_fails_fast() {
    let mut graphql = ScriptedGraphql::default();
    graphql.thread_pages.insert(
        None,
        threads_page(vec![thread("T_gone", false, &[1], Some("c1"))], None),
    );

    let err = fetcher(&graphql)
        .get_all_thread_states(&CallContext::new(), &pr())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::ThreadVanished { thread_id }) if thread_id == "T_gone"
    ));
}

#[tokio::test]
async fn cancelled_context_aborts_fetch() {
    let mut graphql = ScriptedGraphql::default();
    graphql
        .thread_pages
        .insert(None, threads_page(vec![thread("T_a", true, &[1], None)], None));

    let ctx = CallContext::new();
    ctx.cancel();
    let err = fetcher(&graphql)
        .get_all_thread_states(&ctx, &pr())
        .await
        .unwrap_err();

    assert_eq!(err.downcast_ref::<SyncError>(), Some(&SyncError::Cancelled));
    assert_eq!(graphql.call_count(), 0);
}

#[tokio::test]
async fn thread_id_lookup_stops_at_first_match() {
    let mut graphql = ScriptedGraphql::default();
    graphql.thread_pages.insert(
        None,
        threads_page(
            vec![
                thread("T_a", false, &[1], Some("a-c1")),
                thread("T_b", false, &[9], None),
            ],
            Some("page2"),
        ),
    );
    graphql.comment_pages.insert(
        ("T_a".to_string(), "a-c1".to_string()),
        comments_page("T_a", &[2], None),
    );

    let thread_id = fetcher(&graphql)
        .get_review_thread_id(&CallContext::new(), &pr(), 2)
        .await
        .unwrap();

    assert_eq!(thread_id, "T_a");
    assert_eq!(graphql.call_count(), 2);
}

#[tokio::test]
async fn thread_id_lookup_follows_thread_list_to_second_page() {
    let mut graphql = ScriptedGraphql::default();
    graphql.thread_pages.insert(
        None,
        threads_page(vec![thread("T_a", false, &[1], None)], Some("page2")),
    );
    graphql.thread_pages.insert(
        Some("page2".to_string()),
        threads_page(vec![thread("T_b", true, &[7, 8], None)], None),
    );

    let thread_id = fetcher(&graphql)
        .get_review_thread_id(&CallContext::new(), &pr(), 8)
        .await
        .unwrap();

    assert_eq!(thread_id, "T_b");
    assert_eq!(graphql.call_count(), 2);
    assert_eq!(graphql.recorded()[1]["after"], "page2");
}

#[tokio::test]
async fn thread_id_lookup_reports_not_found() {
    let mut graphql = ScriptedGraphql::default();
    graphql
        .thread_pages
        .insert(None, threads_page(vec![thread("T_a", false, &[1], None)], None));

    let err = fetcher(&graphql)
        .get_review_thread_id(&CallContext::new(), &pr(), 404)
        .await
        .unwrap_err();

    assert!(SyncError::is_not_found(&err));
}

#[tokio::test]
async fn resolve_checks_mutation_response() {
    let mut graphql = ScriptedGraphql::default();
    graphql.resolve_result = Some(serde_json::json!({
        "resolveReviewThread": { "thread": { "id": "T_a", "isResolved": false } }
    }));

    let err = fetcher(&graphql)
        .resolve_review_thread(&CallContext::new(), "T_a")
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::ResolveRejected { .. })
    ));

    graphql.resolve_result = Some(serde_json::json!({
        "resolveReviewThread": { "thread": { "id": "T_a", "isResolved": true } }
    }));
    fetcher(&graphql)
        .resolve_review_thread(&CallContext::new(), "T_a")
        .await
        .unwrap();
}

#[test]
fn page_sizes_are_clamped() {
    assert_eq!(PageSizes::new(0, 500), PageSizes::new(1, 100));
}
