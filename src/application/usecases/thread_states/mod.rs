//! PR 전체 코멘트의 스레드 해결 여부를 페이지 단위로 일괄 조회하는 유스케이스.
//!
//! 왕복 횟수는 `스레드 목록 페이지 수 + 2페이지 이상 필요한 스레드의 추가 코멘트 페이지 수`로
//! 제한된다. 코멘트 수와는 무관하다.

mod queries;

use std::collections::HashMap;
use std::ops::ControlFlow;

use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::application::context::CallContext;
use crate::application::ports::GraphqlGateway;
use crate::domain::target::PullRequestRef;
use crate::error::SyncError;

use queries::{
    RESOLVE_THREAD_MUTATION, REVIEW_THREADS_QUERY, ResolveData, THREAD_COMMENTS_QUERY,
    ThreadCommentsData, ThreadsData, comment_ids,
};

/// 원격 connection 한 페이지의 최대 크기.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizes {
    pub threads: u32,
    pub comments: u32,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            threads: MAX_PAGE_SIZE,
            comments: MAX_PAGE_SIZE,
        }
    }
}

impl PageSizes {
    pub fn new(threads: u32, comments: u32) -> Self {
        Self {
            threads: threads.clamp(1, MAX_PAGE_SIZE),
            comments: comments.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// 스레드 하나의 코멘트 페이지 위치.
/// 스레드마다 새로 만들고, 진행할 때는 갱신 대신 새 값을 만든다.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ThreadCommentCursor {
    thread_id: String,
    after: String,
}

impl ThreadCommentCursor {
    fn advance(&self, end_cursor: String) -> Self {
        Self {
            thread_id: self.thread_id.clone(),
            after: end_cursor,
        }
    }
}

/// 방문자에게 넘기는 스레드 코멘트 한 페이지.
struct ThreadCommentPage<'p> {
    thread_id: &'p str,
    is_resolved: bool,
    comment_ids: &'p [i64],
}

/// GraphQL 기반 스레드 상태 조회기.
#[derive(Clone, Copy)]
pub struct ThreadStateFetcher<'a> {
    pub graphql: &'a dyn GraphqlGateway,
    pub page_sizes: PageSizes,
}

impl<'a> ThreadStateFetcher<'a> {
    pub fn new(graphql: &'a dyn GraphqlGateway, page_sizes: PageSizes) -> Self {
        Self {
            graphql,
            page_sizes,
        }
    }

    /// PR의 모든 코멘트 ID -> 스레드 해결 여부 맵을 만든다.
    /// 도중 실패하면 부분 맵을 돌려주지 않고 전체를 실패시킨다.
    pub async fn get_all_thread_states(
        &self,
        ctx: &CallContext,
        pr: &PullRequestRef,
    ) -> Result<HashMap<i64, bool>> {
        let mut states = HashMap::new();
        let round_trips = self
            .walk_threads(ctx, pr, |page| {
                for id in page.comment_ids {
                    states.insert(*id, page.is_resolved);
                }
                ControlFlow::<()>::Continue(())
            })
            .await?
            .1;

        debug!(
            owner = %pr.owner,
            repo = %pr.repo,
            pr = pr.number,
            comments = states.len(),
            round_trips,
            "fetched review thread states"
        );
        Ok(states)
    }

    /// 코멘트가 속한 스레드 ID를 찾는다. 발견 즉시 페이지 순회를 멈춘다.
    pub async fn get_review_thread_id(
        &self,
        ctx: &CallContext,
        pr: &PullRequestRef,
        comment_id: i64,
    ) -> Result<String> {
        let (found, round_trips) = self
            .walk_threads(ctx, pr, |page| {
                if page.comment_ids.contains(&comment_id) {
                    ControlFlow::Break(page.thread_id.to_string())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await?;

        debug!(pr = %pr, comment_id, round_trips, found = found.is_some(), "thread lookup finished");
        found.ok_or_else(|| SyncError::ThreadNotFound { comment_id }.into())
    }

    /// resolve mutation을 보내고, 응답이 해결 상태를 보고하는지 검증한다.
    pub async fn resolve_review_thread(&self, ctx: &CallContext, thread_id: &str) -> Result<()> {
        let data: ResolveData = self
            .query(
                ctx,
                RESOLVE_THREAD_MUTATION,
                json!({ "threadId": thread_id }),
            )
            .await
            .with_context(|| format!("github: failed to resolve review thread {thread_id}"))?;

        let resolved = data
            .resolve_review_thread
            .and_then(|payload| payload.thread)
            .is_some_and(|thread| thread.is_resolved);

        if !resolved {
            return Err(SyncError::ResolveRejected {
                thread_id: thread_id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// 스레드 목록과 스레드별 코멘트 페이지를 순차 순회한다.
    /// 반환값은 (방문자가 중단하며 돌려준 값, 왕복 횟수).
    async fn walk_threads<B, F>(
        &self,
        ctx: &CallContext,
        pr: &PullRequestRef,
        mut visit: F,
    ) -> Result<(Option<B>, usize)>
    where
        F: FnMut(&ThreadCommentPage<'_>) -> ControlFlow<B>,
    {
        let mut round_trips = 0usize;
        let mut threads_after: Option<String> = None;

        loop {
            let data: ThreadsData = self
                .query(
                    ctx,
                    REVIEW_THREADS_QUERY,
                    json!({
                        "owner": pr.owner,
                        "repo": pr.repo,
                        "number": pr.number,
                        "first": self.page_sizes.threads,
                        "commentsFirst": self.page_sizes.comments,
                        "after": threads_after,
                    }),
                )
                .await
                .with_context(|| format!("github: failed to fetch review threads for {pr}"))?;
            round_trips += 1;

            let threads = data
                .repository
                .and_then(|r| r.pull_request)
                .map(|p| p.review_threads)
                .ok_or_else(|| anyhow!("github: pull request {pr} not found"))?;

            for thread in &threads.nodes {
                let first_ids = comment_ids(&thread.comments.nodes);
                let page = ThreadCommentPage {
                    thread_id: &thread.id,
                    is_resolved: thread.is_resolved,
                    comment_ids: &first_ids,
                };
                if let ControlFlow::Break(found) = visit(&page) {
                    return Ok((Some(found), round_trips));
                }

                if !thread.comments.page_info.has_next_page {
                    continue;
                }

                let mut cursor = ThreadCommentCursor {
                    thread_id: thread.id.clone(),
                    after: next_cursor(&thread.comments.page_info, &thread.id)?,
                };
                loop {
                    let (ids, next) = self.fetch_thread_comments(ctx, &cursor).await?;
                    round_trips += 1;

                    let page = ThreadCommentPage {
                        thread_id: &cursor.thread_id,
                        is_resolved: thread.is_resolved,
                        comment_ids: &ids,
                    };
                    if let ControlFlow::Break(found) = visit(&page) {
                        return Ok((Some(found), round_trips));
                    }

                    match next {
                        Some(end_cursor) => cursor = cursor.advance(end_cursor),
                        None => break,
                    }
                }
            }

            if !threads.page_info.has_next_page {
                return Ok((None, round_trips));
            }
            threads_after = Some(next_cursor(&threads.page_info, "reviewThreads")?);
        }
    }

    /// 스레드 범위 후속 조회. (코멘트 ID들, 다음 커서)를 반환한다.
    async fn fetch_thread_comments(
        &self,
        ctx: &CallContext,
        cursor: &ThreadCommentCursor,
    ) -> Result<(Vec<i64>, Option<String>)> {
        let data: ThreadCommentsData = self
            .query(
                ctx,
                THREAD_COMMENTS_QUERY,
                json!({
                    "threadId": cursor.thread_id,
                    "first": self.page_sizes.comments,
                    "after": cursor.after,
                }),
            )
            .await
            .with_context(|| {
                format!(
                    "github: failed to fetch comments of review thread {}",
                    cursor.thread_id
                )
            })?;

        let Some(node) = data.node else {
            return Err(SyncError::ThreadVanished {
                thread_id: cursor.thread_id.clone(),
            }
            .into());
        };

        let ids = comment_ids(&node.comments.nodes);
        let next = if node.comments.page_info.has_next_page {
            Some(next_cursor(&node.comments.page_info, &cursor.thread_id)?)
        } else {
            None
        };
        Ok((ids, next))
    }

    async fn query<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        query: &str,
        variables: Value,
    ) -> Result<T> {
        let response = ctx.run(self.graphql.execute(query, variables)).await?;
        let data = response.into_data()?;
        serde_json::from_value(data).context("github: invalid graphql payload")
    }
}

fn next_cursor(page_info: &queries::PageInfo, scope: &str) -> Result<String> {
    page_info
        .end_cursor
        .clone()
        .ok_or_else(|| anyhow!("github: {scope} reports another page but no endCursor"))
}

#[cfg(test)]
mod tests;
