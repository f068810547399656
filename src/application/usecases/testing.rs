//! 유스케이스 테스트용 인메모리 포트 구현.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::application::ports::{
    GraphqlGateway, GraphqlResponse, RawComment, RawReview, ReviewSource, TaskStore,
};
use crate::domain::target::PullRequestRef;
use crate::domain::task::Task;

/// 스레드 목록/스레드별 코멘트 페이지를 커서 기준으로 돌려주는 GraphQL 가짜 구현.
/// 받은 요청은 모두 기록한다.
#[derive(Default)]
pub struct ScriptedGraphql {
    /// after 커서(None = 첫 페이지) -> data
    pub thread_pages: HashMap<Option<String>, Value>,
    /// (threadId, after) -> data
    pub comment_pages: HashMap<(String, String), Value>,
    pub resolve_result: Option<Value>,
    pub errors: Vec<String>,
    pub calls: Mutex<Vec<Value>>,
}

impl ScriptedGraphql {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn recorded(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphqlGateway for ScriptedGraphql {
    async fn execute(&self, query: &str, variables: Value) -> Result<GraphqlResponse> {
        self.calls.lock().unwrap().push(variables.clone());

        if !self.errors.is_empty() {
            let errors: Vec<Value> = self.errors.iter().map(|m| json!({ "message": m })).collect();
            return Ok(serde_json::from_value(json!({ "data": null, "errors": errors }))?);
        }

        if query.contains("resolveReviewThread") {
            let data = self
                .resolve_result
                .clone()
                .ok_or_else(|| anyhow!("unscripted resolve"))?;
            return Ok(GraphqlResponse::from_data(data));
        }

        let after = variables["after"].as_str().map(ToString::to_string);
        if let Some(thread_id) = variables["threadId"].as_str() {
            let key = (thread_id.to_string(), after.unwrap_or_default());
            let data = self
                .comment_pages
                .get(&key)
                .cloned()
                .unwrap_or_else(|| json!({ "node": null }));
            return Ok(GraphqlResponse::from_data(data));
        }

        self.thread_pages
            .get(&after)
            .cloned()
            .map(GraphqlResponse::from_data)
            .ok_or_else(|| anyhow!("unscripted thread page {after:?}"))
    }
}

pub fn page_info(next: Option<&str>) -> Value {
    json!({ "hasNextPage": next.is_some(), "endCursor": next })
}

pub fn thread(id: &str, resolved: bool, ids: &[i64], next: Option<&str>) -> Value {
    let nodes: Vec<Value> = ids.iter().map(|id| json!({ "databaseId": id })).collect();
    json!({
        "id": id,
        "isResolved": resolved,
        "comments": { "pageInfo": page_info(next), "nodes": nodes },
    })
}

pub fn threads_page(threads: Vec<Value>, next: Option<&str>) -> Value {
    json!({
        "repository": {
            "pullRequest": {
                "reviewThreads": { "pageInfo": page_info(next), "nodes": threads }
            }
        }
    })
}

pub fn comments_page(thread_id: &str, ids: &[i64], next: Option<&str>) -> Value {
    let nodes: Vec<Value> = ids.iter().map(|id| json!({ "databaseId": id })).collect();
    json!({
        "node": {
            "id": thread_id,
            "comments": { "pageInfo": page_info(next), "nodes": nodes }
        }
    })
}

pub fn pr() -> PullRequestRef {
    PullRequestRef::new("acme", "widgets", 7)
}

/// REST 조회 가짜 구현. 호출 횟수를 센다.
#[derive(Default)]
pub struct StaticReviewSource {
    pub reviews: Vec<RawReview>,
    pub review_comments: Vec<RawComment>,
    pub issue_comments: Vec<RawComment>,
    pub calls: Mutex<usize>,
}

impl StaticReviewSource {
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn bump(&self) {
        *self.calls.lock().unwrap() += 1;
    }
}

#[async_trait]
impl ReviewSource for StaticReviewSource {
    async fn list_reviews(&self, _pr: &PullRequestRef) -> Result<Vec<RawReview>> {
        self.bump();
        Ok(self.reviews.clone())
    }

    async fn list_review_comments(&self, _pr: &PullRequestRef) -> Result<Vec<RawComment>> {
        self.bump();
        Ok(self.review_comments.clone())
    }

    async fn list_issue_comments(&self, _pr: &PullRequestRef) -> Result<Vec<RawComment>> {
        self.bump();
        Ok(self.issue_comments.clone())
    }
}

pub fn raw_review(id: i64, author: &str, body: &str, submitted_at: &str) -> RawReview {
    RawReview {
        id,
        author: author.to_string(),
        state: "COMMENTED".to_string(),
        body: body.to_string(),
        submitted_at: submitted_at.to_string(),
    }
}

pub fn raw_comment(id: i64, review_id: i64, body: &str, in_reply_to_id: Option<i64>) -> RawComment {
    RawComment {
        id,
        author: "codex-bot".to_string(),
        body: body.to_string(),
        created_at: "2026-01-01T10:00:00Z".to_string(),
        path: "src/lib.rs".to_string(),
        line: Some(10),
        review_id: Some(review_id),
        in_reply_to_id,
    }
}

#[derive(Default)]
pub struct MemoryTaskStore {
    pub tasks: Mutex<Vec<Task>>,
}

impl TaskStore for MemoryTaskStore {
    fn tasks_by_source_comment_id(&self, comment_id: i64) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.source_comment_id == comment_id)
            .cloned()
            .collect())
    }
}
