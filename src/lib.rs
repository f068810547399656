//! prsync library root.
//! 리뷰 동기화 엔진(캐시/스레드 상태/중복 제거/해결 정책/코멘트 비교)을 외부에 노출한다.

use anyhow::Result;

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interface;

use application::context::CallContext;
use domain::review::{Comment, CommentComparisonResult};
use domain::target::PullRequestRef;
use interface::AppComposition;

/// 라이브러리 직접 호출용 비교 함수.
/// PR URL로 호스트를 판별해 설정을 조립하고 로컬 코멘트와 원격 상태를 비교한다.
pub async fn compare_pull_request(
    url: &str,
    local_comments: &[Comment],
) -> Result<CommentComparisonResult> {
    let (host, pr) = PullRequestRef::parse(url)?;
    let composition = AppComposition::load(&host)?;
    composition
        .compare_usecase()
        .fetch_and_compare_comments(&CallContext::new(), &pr, local_comments)
        .await
}
