//! 호출자가 구분해야 하는 동기화 오류 분류.
//!
//! 포트/어댑터는 `anyhow::Result`로 전파하고, 아래 변형들은 `anyhow::Error` 안에
//! 담겨 올라간다. 호출자는 `err.downcast_ref::<SyncError>()`로 꺼내 분기한다.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// GraphQL 응답의 `errors[]`가 비어 있지 않음. HTTP 상태와 무관하게 실패.
    #[error("github graphql error: {}", messages.join("; "))]
    Remote { messages: Vec<String> },

    /// 모든 페이지를 소진했지만 코멘트가 속한 스레드를 찾지 못함.
    #[error("no review thread found for comment {comment_id}")]
    ThreadNotFound { comment_id: i64 },

    /// 스레드 단위 후속 조회가 노드를 돌려주지 않음(원격 목록 불일치).
    #[error("review thread {thread_id} disappeared during comment pagination")]
    ThreadVanished { thread_id: String },

    /// resolve mutation 응답이 해결 상태를 보고하지 않음.
    #[error("review thread {thread_id} was not resolved by the mutation")]
    ResolveRejected { thread_id: String },

    #[error("invalid resolution mode '{value}' (expected immediate, complete or disabled)")]
    InvalidMode { value: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

impl SyncError {
    /// anyhow 체인 어디에든 `ThreadNotFound`가 있으면 true.
    pub fn is_not_found(err: &anyhow::Error) -> bool {
        err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<SyncError>(),
                Some(SyncError::ThreadNotFound { .. })
            )
        })
    }
}
