//! 리뷰 스레드 GraphQL 쿼리와 응답 스키마.

use serde::Deserialize;

/// PR의 스레드 목록 한 페이지. 각 스레드의 첫 코멘트 페이지를 함께 받는다.
pub(super) const REVIEW_THREADS_QUERY: &str = r#"
query($owner: String!, $repo: String!, $number: Int!, $first: Int!, $commentsFirst: Int!, $after: String) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $number) {
      reviewThreads(first: $first, after: $after) {
        pageInfo { hasNextPage endCursor }
        nodes {
          id
          isResolved
          comments(first: $commentsFirst) {
            pageInfo { hasNextPage endCursor }
            nodes { databaseId }
          }
        }
      }
    }
  }
}
"#;

/// 특정 스레드 하나의 코멘트 후속 페이지. 스레드 ID와 그 스레드 전용 커서만 사용한다.
pub(super) const THREAD_COMMENTS_QUERY: &str = r#"
query($threadId: ID!, $first: Int!, $after: String) {
  node(id: $threadId) {
    ... on PullRequestReviewThread {
      id
      comments(first: $first, after: $after) {
        pageInfo { hasNextPage endCursor }
        nodes { databaseId }
      }
    }
  }
}
"#;

pub(super) const RESOLVE_THREAD_MUTATION: &str = r#"
mutation($threadId: ID!) {
  resolveReviewThread(input: { threadId: $threadId }) {
    thread { id isResolved }
  }
}
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Connection<T> {
    pub page_info: PageInfo,
    // `default`만 쓰면 derive가 `T: Default`를 요구한다.
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ThreadsData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RepositoryNode {
    pub pull_request: Option<PullRequestNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PullRequestNode {
    pub review_threads: Connection<ThreadNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ThreadNode {
    pub id: String,
    pub is_resolved: bool,
    pub comments: Connection<CommentNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CommentNode {
    pub database_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ThreadCommentsData {
    pub node: Option<ThreadCommentsNode>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ThreadCommentsNode {
    pub comments: Connection<CommentNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ResolveData {
    pub resolve_review_thread: Option<ResolvePayload>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResolvePayload {
    pub thread: Option<ResolvedThread>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ResolvedThread {
    pub is_resolved: bool,
}

pub(super) fn comment_ids(nodes: &[CommentNode]) -> Vec<i64> {
    nodes.iter().filter_map(|n| n.database_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_page_decodes_with_missing_or_null_ids() {
        let data: ThreadsData = serde_json::from_value(serde_json::json!({
            "repository": { "pullRequest": { "reviewThreads": {
                "pageInfo": { "hasNextPage": false, "endCursor": null },
                "nodes": [{
                    "id": "T_a",
                    "isResolved": true,
                    "comments": {
                        "pageInfo": { "hasNextPage": false, "endCursor": null },
                        "nodes": [{ "databaseId": 5 }, { "databaseId": null }]
                    }
                }, {
                    "id": "T_b",
                    "isResolved": false,
                    "comments": { "pageInfo": { "hasNextPage": false, "endCursor": null } }
                }]
            }}}
        }))
        .unwrap();

        let threads = data.repository.unwrap().pull_request.unwrap().review_threads;
        assert_eq!(threads.nodes.len(), 2);
        assert_eq!(comment_ids(&threads.nodes[0].comments.nodes), vec![5]);
        assert!(threads.nodes[1].comments.nodes.is_empty());
    }
}
