//! 리뷰/코멘트 도메인 엔티티와 동기화 결과 값 객체.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 원격 리뷰 1건. 동기화 1회 안에서는 불변으로 취급한다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub reviewer: String,
    pub state: String,
    pub body: String,
    /// 정렬 가능한 RFC3339 문자열
    pub submitted_at: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// 리뷰 코멘트. `id == 0`은 원격 식별자가 없는 합성 코멘트다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub line: u32,
    pub body: String,
    pub author: String,
    pub created_at: String,
    #[serde(default)]
    pub replies: Vec<Reply>,
    #[serde(default)]
    pub github_thread_resolved: bool,
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tasks_generated: bool,
    #[serde(default)]
    pub all_tasks_completed: bool,
}

impl Comment {
    /// 원격 스레드와 매칭 가능한 코멘트인지 여부.
    pub fn has_remote_identity(&self) -> bool {
        self.id != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: i64,
    pub author: String,
    pub body: String,
    pub created_at: String,
}

/// 동기화 시점의 스레드 해결 상태 스냅샷. 이전 값과 병합하지 않는다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewThreadStatus {
    pub comment_id: i64,
    pub github_thread_resolved: bool,
    pub last_checked_at: DateTime<Utc>,
    pub in_reply_to_id: Option<i64>,
}

/// 코멘트 집합을 세 개의 서로소 목록으로 분할한 결과.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnresolvedCommentsReport {
    pub unanalyzed: Vec<Comment>,
    pub in_progress: Vec<Comment>,
    pub resolved: Vec<Comment>,
}

impl UnresolvedCommentsReport {
    /// 미분석/진행중 코멘트가 하나도 없으면 완료로 본다.
    pub fn is_complete(&self) -> bool {
        self.unanalyzed.is_empty() && self.in_progress.is_empty()
    }

    pub fn total(&self) -> usize {
        self.unanalyzed.len() + self.in_progress.len() + self.resolved.len()
    }
}

/// 원격 상태와 로컬 코멘트 집합의 비교 결과.
#[derive(Debug, Clone, Default)]
pub struct CommentComparisonResult {
    pub new_comments: Vec<Comment>,
    pub modified_comments: Vec<Comment>,
    pub deleted_comments: Vec<Comment>,
    pub report: UnresolvedCommentsReport,
}

impl CommentComparisonResult {
    pub fn has_changes(&self) -> bool {
        !self.new_comments.is_empty()
            || !self.modified_comments.is_empty()
            || !self.deleted_comments.is_empty()
    }
}
