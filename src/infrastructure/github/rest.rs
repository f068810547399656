//! GitHub REST 리뷰/코멘트 조회 어댑터.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::GitHubConnection;
use crate::application::ports::{RawComment, RawReview, ReviewSource};
use crate::domain::target::PullRequestRef;

const PER_PAGE: usize = 100;
const GHOST_USER: &str = "ghost";

pub struct GitHubRestClient {
    conn: GitHubConnection,
}

impl GitHubRestClient {
    pub fn new(conn: GitHubConnection) -> Self {
        Self { conn }
    }

    fn repo_endpoint(&self, pr: &PullRequestRef) -> String {
        format!("{}/repos/{}/{}", self.conn.api_base(), pr.owner, pr.repo)
    }

    /// `per_page` 단위로 마지막(짧은) 페이지가 나올 때까지 순회한다.
    async fn get_all<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut page = 1usize;

        loop {
            let resp = self
                .conn
                .request(Method::GET, format!("{url}?per_page={PER_PAGE}&page={page}"))
                .send()
                .await
                .with_context(|| format!("github: failed to list {what}"))?;

            let status = resp.status();
            let body = resp
                .text()
                .await
                .with_context(|| format!("github: failed to read {what} body"))?;

            if !status.is_success() {
                anyhow::bail!("github: failed to list {what} ({status}): {body}");
            }

            let items: Vec<T> = serde_json::from_str(&body)
                .with_context(|| format!("github: invalid {what} JSON"))?;
            let count = items.len();
            out.extend(items);

            if count < PER_PAGE {
                return Ok(out);
            }
            page += 1;
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ReviewResponse {
    id: i64,
    user: Option<UserResponse>,
    state: String,
    body: Option<String>,
    submitted_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentResponse {
    id: i64,
    user: Option<UserResponse>,
    body: Option<String>,
    created_at: Option<String>,
    path: Option<String>,
    line: Option<u32>,
    original_line: Option<u32>,
    pull_request_review_id: Option<i64>,
    in_reply_to_id: Option<i64>,
}

fn login(user: Option<UserResponse>) -> String {
    user.map(|u| u.login)
        .unwrap_or_else(|| GHOST_USER.to_string())
}

impl From<ReviewResponse> for RawReview {
    fn from(r: ReviewResponse) -> Self {
        RawReview {
            id: r.id,
            author: login(r.user),
            state: r.state,
            body: r.body.unwrap_or_default(),
            submitted_at: r.submitted_at.unwrap_or_default(),
        }
    }
}

impl From<CommentResponse> for RawComment {
    fn from(c: CommentResponse) -> Self {
        RawComment {
            id: c.id,
            author: login(c.user),
            body: c.body.unwrap_or_default(),
            created_at: c.created_at.unwrap_or_default(),
            path: c.path.unwrap_or_default(),
            // outdated 코멘트는 line이 비어 있으므로 original_line으로 보충한다.
            line: c.line.or(c.original_line),
            review_id: c.pull_request_review_id,
            in_reply_to_id: c.in_reply_to_id,
        }
    }
}

#[async_trait]
impl ReviewSource for GitHubRestClient {
    async fn list_reviews(&self, pr: &PullRequestRef) -> Result<Vec<RawReview>> {
        let url = format!("{}/pulls/{}/reviews", self.repo_endpoint(pr), pr.number);
        let reviews: Vec<ReviewResponse> = self.get_all(&url, "reviews").await?;
        Ok(reviews.into_iter().map(RawReview::from).collect())
    }

    async fn list_review_comments(&self, pr: &PullRequestRef) -> Result<Vec<RawComment>> {
        let url = format!("{}/pulls/{}/comments", self.repo_endpoint(pr), pr.number);
        let comments: Vec<CommentResponse> = self.get_all(&url, "review comments").await?;
        Ok(comments.into_iter().map(RawComment::from).collect())
    }

    async fn list_issue_comments(&self, pr: &PullRequestRef) -> Result<Vec<RawComment>> {
        let url = format!("{}/issues/{}/comments", self.repo_endpoint(pr), pr.number);
        let comments: Vec<CommentResponse> = self.get_all(&url, "issue comments").await?;
        Ok(comments.into_iter().map(RawComment::from).collect())
    }
}
