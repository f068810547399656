//! 원격 호출마다 적용되는 취소/마감 시한 컨텍스트.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::SyncError;

/// 호출자가 넘겨주는 취소 가능한 호출 컨텍스트.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// 부모가 취소되면 함께 취소되는 하위 컨텍스트. 마감 시한은 물려받는다.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// 원격 호출 1회를 취소/마감과 경합시킨다.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.token.is_cancelled() {
            return Err(SyncError::Cancelled.into());
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Err(SyncError::DeadlineExceeded.into());
        }

        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(SyncError::Cancelled.into()),
            _ = deadline => Err(SyncError::DeadlineExceeded.into()),
            res = fut => res,
        }
    }
}
