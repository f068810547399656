//! 애플리케이션 계층이 의존하는 포트(추상 인터페이스) 모음.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::target::PullRequestRef;
use crate::domain::task::Task;
use crate::error::SyncError;

/// REST 리뷰 레코드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReview {
    pub id: i64,
    pub author: String,
    pub state: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub submitted_at: String,
}

/// REST 코멘트 레코드(리뷰 코멘트/이슈 코멘트 공용).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawComment {
    pub id: i64,
    pub author: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub review_id: Option<i64>,
    #[serde(default)]
    pub in_reply_to_id: Option<i64>,
}

/// 코드 리뷰 호스트 REST 조회 포트.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn list_reviews(&self, pr: &PullRequestRef) -> Result<Vec<RawReview>>;
    async fn list_review_comments(&self, pr: &PullRequestRef) -> Result<Vec<RawComment>>;
    async fn list_issue_comments(&self, pr: &PullRequestRef) -> Result<Vec<RawComment>>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

impl GraphqlResponse {
    pub fn from_data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// `errors[]`가 하나라도 있으면 HTTP 상태와 무관하게 실패로 본다.
    pub fn into_data(self) -> Result<Value> {
        if !self.errors.is_empty() {
            return Err(SyncError::Remote {
                messages: self.errors.into_iter().map(|e| e.message).collect(),
            }
            .into());
        }
        self.data
            .ok_or_else(|| anyhow!("github: graphql response has no data"))
    }
}

/// GraphQL 엔드포인트 실행 포트.
#[async_trait]
pub trait GraphqlGateway: Send + Sync {
    async fn execute(&self, query: &str, variables: Value) -> Result<GraphqlResponse>;
}

/// 로컬 작업 저장소 조회 포트.
pub trait TaskStore: Send + Sync {
    fn tasks_by_source_comment_id(&self, comment_id: i64) -> Result<Vec<Task>>;
}
