//! 원격 코멘트 상태와 로컬 코멘트 집합을 비교해 new/modified/deleted 차이를 만든다.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use tracing::info;

use crate::application::context::CallContext;
use crate::application::usecases::fetch_reviews::FetchReviewsUseCase;
use crate::application::usecases::track_resolution::{
    ThreadResolutionTracker, detect_unresolved_comments,
};
use crate::domain::review::{Comment, CommentComparisonResult};
use crate::domain::target::PullRequestRef;

/// 코멘트 동일성 키. 원격 ID가 없는 합성 코멘트는 위치+본문으로 식별한다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CommentKey {
    Remote(i64),
    Embedded {
        file_path: String,
        line: u32,
        body: String,
    },
}

impl CommentKey {
    fn of(comment: &Comment) -> Self {
        if comment.has_remote_identity() {
            Self::Remote(comment.id)
        } else {
            Self::Embedded {
                file_path: comment.file_path.clone(),
                line: comment.line,
                body: comment.body.trim().to_string(),
            }
        }
    }
}

#[derive(Clone, Copy)]
pub struct CompareCommentsUseCase<'a> {
    pub reviews: FetchReviewsUseCase<'a>,
    pub tracker: ThreadResolutionTracker<'a>,
}

impl<'a> CompareCommentsUseCase<'a> {
    /// 원격 리뷰(중복 제거) -> 코멘트 평탄화 -> 스레드 상태 반영 -> 로컬 집합과 비교.
    pub async fn fetch_and_compare_comments(
        &self,
        ctx: &CallContext,
        pr: &PullRequestRef,
        local_comments: &[Comment],
    ) -> Result<CommentComparisonResult> {
        let reviews = self.reviews.fetch_reviews(ctx, pr, false).await?;
        let mut remote: Vec<Comment> = reviews.into_iter().flat_map(|r| r.comments).collect();

        let statuses = self
            .tracker
            .update_thread_resolution_status(ctx, pr, &remote)
            .await?;
        let by_id: HashMap<i64, _> = statuses.iter().map(|s| (s.comment_id, s)).collect();
        for comment in &mut remote {
            if let Some(status) = by_id.get(&comment.id) {
                comment.github_thread_resolved = status.github_thread_resolved;
                comment.last_checked_at = Some(status.last_checked_at);
            }
        }

        let mut result = diff_comments(local_comments, &remote);
        let merged = update_comment_states(local_comments, &result);
        result.report = detect_unresolved_comments(&merged, &statuses);

        info!(
            pr = %pr,
            new = result.new_comments.len(),
            modified = result.modified_comments.len(),
            deleted = result.deleted_comments.len(),
            complete = result.report.is_complete(),
            "comment states compared"
        );
        Ok(result)
    }
}

/// 본문 또는 해결 여부가 달라진 코멘트를 modified로 본다.
pub fn diff_comments(local: &[Comment], remote: &[Comment]) -> CommentComparisonResult {
    let local_by_key: HashMap<CommentKey, &Comment> =
        local.iter().map(|c| (CommentKey::of(c), c)).collect();
    let remote_keys: HashSet<CommentKey> = remote.iter().map(CommentKey::of).collect();

    let mut result = CommentComparisonResult::default();
    for comment in remote {
        match local_by_key.get(&CommentKey::of(comment)) {
            None => result.new_comments.push(comment.clone()),
            Some(existing)
                if existing.body != comment.body
                    || existing.github_thread_resolved != comment.github_thread_resolved =>
            {
                result.modified_comments.push(comment.clone());
            }
            Some(_) => {}
        }
    }

    result.deleted_comments = local
        .iter()
        .filter(|c| !remote_keys.contains(&CommentKey::of(c)))
        .cloned()
        .collect();
    result
}

/// 비교 결과를 로컬 목록에 반영한다.
/// 본문/해결 상태/답글은 원격 값을 따르고, 작업 추적 필드는 로컬 값을 유지한다.
pub fn update_comment_states(local: &[Comment], diff: &CommentComparisonResult) -> Vec<Comment> {
    let modified: HashMap<CommentKey, &Comment> = diff
        .modified_comments
        .iter()
        .map(|c| (CommentKey::of(c), c))
        .collect();
    let deleted: HashSet<CommentKey> = diff.deleted_comments.iter().map(CommentKey::of).collect();

    let mut out: Vec<Comment> = local
        .iter()
        .filter(|c| !deleted.contains(&CommentKey::of(c)))
        .map(|c| match modified.get(&CommentKey::of(c)) {
            Some(remote) => Comment {
                body: remote.body.clone(),
                github_thread_resolved: remote.github_thread_resolved,
                last_checked_at: remote.last_checked_at,
                replies: remote.replies.clone(),
                ..c.clone()
            },
            None => c.clone(),
        })
        .collect();

    out.extend(diff.new_comments.iter().cloned());
    out
}
