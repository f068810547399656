//! 코멘트별 스레드 해결 상태 추적과 미해결 코멘트 분류.

use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;
use futures::future::try_join_all;
use tracing::debug;

use crate::application::context::CallContext;
use crate::application::usecases::thread_states::ThreadStateFetcher;
use crate::domain::review::{Comment, ReviewThreadStatus, UnresolvedCommentsReport};
use crate::domain::target::PullRequestRef;

#[derive(Clone, Copy)]
pub struct ThreadResolutionTracker<'a> {
    pub fetcher: ThreadStateFetcher<'a>,
}

impl<'a> ThreadResolutionTracker<'a> {
    pub fn new(fetcher: ThreadStateFetcher<'a>) -> Self {
        Self { fetcher }
    }

    /// 코멘트 수와 무관하게 일괄 조회를 정확히 한 번 수행하고, 모든 코멘트(답글 포함)에 상태를 매긴다.
    /// 조회 결과에 없는 코멘트는 미해결로 본다.
    pub async fn update_thread_resolution_status(
        &self,
        ctx: &CallContext,
        pr: &PullRequestRef,
        comments: &[Comment],
    ) -> Result<Vec<ReviewThreadStatus>> {
        let states = self.fetcher.get_all_thread_states(ctx, pr).await?;
        let checked_at = Utc::now();

        let mut statuses = Vec::with_capacity(comments.len());
        for comment in comments {
            let resolved = comment.has_remote_identity()
                && states.get(&comment.id).copied().unwrap_or(false);
            statuses.push(ReviewThreadStatus {
                comment_id: comment.id,
                github_thread_resolved: resolved,
                last_checked_at: checked_at,
                in_reply_to_id: None,
            });

            for reply in &comment.replies {
                statuses.push(ReviewThreadStatus {
                    comment_id: reply.id,
                    github_thread_resolved: states.get(&reply.id).copied().unwrap_or(resolved),
                    last_checked_at: checked_at,
                    in_reply_to_id: Some(comment.id),
                });
            }
        }

        debug!(pr = %pr, comments = comments.len(), "thread resolution statuses updated");
        Ok(statuses)
    }

    /// 서로 독립인 여러 PR을 동시에 추적한다. PR 하나라도 실패하면 전체가 실패한다.
    pub async fn update_many(
        &self,
        ctx: &CallContext,
        targets: &[(PullRequestRef, Vec<Comment>)],
    ) -> Result<Vec<Vec<ReviewThreadStatus>>> {
        try_join_all(targets.iter().map(|(pr, comments)| {
            let child = ctx.child();
            async move {
                self.update_thread_resolution_status(&child, pr, comments)
                    .await
            }
        }))
        .await
    }
}

/// 로컬 코멘트를 unanalyzed / in_progress / resolved 중 정확히 하나로 분류한다.
pub fn detect_unresolved_comments(
    local_comments: &[Comment],
    statuses: &[ReviewThreadStatus],
) -> UnresolvedCommentsReport {
    let by_id: HashMap<i64, &ReviewThreadStatus> =
        statuses.iter().map(|s| (s.comment_id, s)).collect();

    let mut report = UnresolvedCommentsReport::default();
    for comment in local_comments {
        let status = if comment.has_remote_identity() {
            by_id.get(&comment.id)
        } else {
            None
        };

        match status {
            None => report.unanalyzed.push(comment.clone()),
            Some(s) if s.github_thread_resolved => report.resolved.push(comment.clone()),
            Some(_) if comment.tasks_generated => report.in_progress.push(comment.clone()),
            Some(_) => report.unanalyzed.push(comment.clone()),
        }
    }
    report
}
