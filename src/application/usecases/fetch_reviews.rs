//! REST 리뷰/코멘트 조회(캐시 경유) 후 도메인 리뷰로 조립하고 중복을 제거한다.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::application::context::CallContext;
use crate::application::ports::{RawComment, RawReview, ReviewSource};
use crate::domain::fingerprint::deduplicate;
use crate::domain::review::{Comment, Reply, Review};
use crate::domain::target::PullRequestRef;
use crate::infrastructure::cache::ResponseCache;

pub const OP_LIST_REVIEWS: &str = "ListReviews";
pub const OP_LIST_REVIEW_COMMENTS: &str = "ListReviewComments";
pub const OP_LIST_ISSUE_COMMENTS: &str = "ListIssueComments";

const ISSUE_COMMENT_STATE: &str = "COMMENTED";

#[derive(Clone, Copy)]
pub struct FetchReviewsUseCase<'a> {
    pub source: &'a dyn ReviewSource,
    pub cache: Option<&'a ResponseCache>,
}

impl<'a> FetchReviewsUseCase<'a> {
    /// PR의 리뷰를 조회해 중복 제거된 목록을 돌려준다.
    /// `refresh`면 캐시 읽기를 건너뛰지만 결과는 다시 캐시에 쓴다.
    pub async fn fetch_reviews(
        &self,
        ctx: &CallContext,
        pr: &PullRequestRef,
        refresh: bool,
    ) -> Result<Vec<Review>> {
        let reviews: Vec<RawReview> = self
            .cached(ctx, OP_LIST_REVIEWS, pr, refresh, || self.source.list_reviews(pr))
            .await?;
        let review_comments: Vec<RawComment> = self
            .cached(ctx, OP_LIST_REVIEW_COMMENTS, pr, refresh, || {
                self.source.list_review_comments(pr)
            })
            .await?;
        let issue_comments: Vec<RawComment> = self
            .cached(ctx, OP_LIST_ISSUE_COMMENTS, pr, refresh, || {
                self.source.list_issue_comments(pr)
            })
            .await?;

        let assembled = assemble_reviews(reviews, review_comments, issue_comments);
        let before = assembled.len();
        let deduped = deduplicate(assembled);
        debug!(pr = %pr, before, after = deduped.len(), "reviews fetched and deduplicated");
        Ok(deduped)
    }

    async fn cached<T, F, Fut>(
        &self,
        ctx: &CallContext,
        operation: &str,
        pr: &PullRequestRef,
        refresh: bool,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !refresh
            && let Some(cache) = self.cache
            && let Some(hit) = cache
                .get_async::<T>(operation, &pr.owner, &pr.repo, &[&pr.number])
                .await
        {
            debug!(operation, pr = %pr, "cache hit");
            return Ok(hit);
        }

        let value = ctx
            .run(fetch())
            .await
            .with_context(|| format!("github: {operation} failed for {pr}"))?;

        if let Some(cache) = self.cache {
            cache
                .set_async(operation, &pr.owner, &pr.repo, &value, &[&pr.number])
                .await?;
        }
        Ok(value)
    }
}

/// REST 레코드를 리뷰 단위로 묶는다.
/// - 답글(`in_reply_to_id`)은 루트 코멘트의 `replies`로 접는다.
/// - 리뷰에 속하지 않은 코멘트는 작성자 기준 합성 리뷰(id 0)로 묶는다.
/// - 이슈 코멘트는 본문만 있는 리뷰가 된다.
pub fn assemble_reviews(
    reviews: Vec<RawReview>,
    review_comments: Vec<RawComment>,
    issue_comments: Vec<RawComment>,
) -> Vec<Review> {
    let known_ids: HashSet<i64> = review_comments.iter().map(|c| c.id).collect();

    let mut roots: Vec<RawComment> = Vec::new();
    let mut replies: HashMap<i64, Vec<Reply>> = HashMap::new();
    for raw in review_comments {
        match raw.in_reply_to_id {
            Some(parent) if known_ids.contains(&parent) => {
                replies.entry(parent).or_default().push(Reply {
                    id: raw.id,
                    author: raw.author,
                    body: raw.body,
                    created_at: raw.created_at,
                });
            }
            _ => roots.push(raw),
        }
    }

    let mut by_review: HashMap<i64, Vec<Comment>> = HashMap::new();
    let mut orphans: BTreeMap<String, Vec<Comment>> = BTreeMap::new();
    let review_ids: HashSet<i64> = reviews.iter().map(|r| r.id).collect();

    for raw in roots {
        let review_id = raw.review_id;
        let author = raw.author.clone();
        let mut comment = to_comment(raw);
        comment.replies = replies.remove(&comment.id).unwrap_or_default();

        match review_id {
            Some(id) if review_ids.contains(&id) => by_review.entry(id).or_default().push(comment),
            _ => orphans.entry(author).or_default().push(comment),
        }
    }

    let mut out: Vec<Review> = reviews
        .into_iter()
        .map(|raw| Review {
            comments: by_review.remove(&raw.id).unwrap_or_default(),
            id: raw.id,
            reviewer: raw.author,
            state: raw.state,
            body: raw.body,
            submitted_at: raw.submitted_at,
        })
        .collect();

    for (author, comments) in orphans {
        let submitted_at = comments
            .iter()
            .map(|c| c.created_at.clone())
            .max()
            .unwrap_or_default();
        out.push(Review {
            id: 0,
            reviewer: author,
            state: ISSUE_COMMENT_STATE.to_string(),
            body: String::new(),
            submitted_at,
            comments,
        });
    }

    out.extend(issue_comments.into_iter().map(|raw| Review {
        id: raw.id,
        reviewer: raw.author,
        state: ISSUE_COMMENT_STATE.to_string(),
        body: raw.body,
        submitted_at: raw.created_at,
        comments: Vec::new(),
    }));

    out
}

fn to_comment(raw: RawComment) -> Comment {
    Comment {
        id: raw.id,
        file_path: raw.path,
        line: raw.line.unwrap_or(0),
        body: raw.body,
        author: raw.author,
        created_at: raw.created_at,
        replies: Vec::new(),
        github_thread_resolved: false,
        last_checked_at: None,
        tasks_generated: false,
        all_tasks_completed: false,
    }
}
