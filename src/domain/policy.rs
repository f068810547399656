//! 스레드 해결 정책(모드 파싱, 작업 완료 수 기반 판단).

use std::fmt;
use std::str::FromStr;

use crate::domain::task::Task;
use crate::error::SyncError;

/// 작업 완료 시 원격 스레드를 언제 해결할지 정하는 정책 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionMode {
    /// 코멘트 아래 작업 하나라도 완료되면 즉시 해결
    Immediate,
    /// 코멘트 아래 모든 작업이 완료됐을 때만 해결
    #[default]
    Complete,
    Disabled,
}

impl ResolutionMode {
    pub fn code(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Complete => "complete",
            Self::Disabled => "disabled",
        }
    }
}

impl FromStr for ResolutionMode {
    type Err = SyncError;

    /// 대소문자/앞뒤 공백을 무시하고 파싱한다. 알 수 없는 값은 즉시 실패.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "complete" => Ok(Self::Complete),
            "disabled" => Ok(Self::Disabled),
            _ => Err(SyncError::InvalidMode {
                value: raw.to_string(),
            }),
        }
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 작업 완료 이벤트 1건에 대한 판단 결과. 저장하지 않는 지시값이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub thread_resolved: bool,
    pub comment_id: i64,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub remaining_tasks: usize,
    pub mode: ResolutionMode,
    pub message: String,
    pub should_notify: bool,
}

/// 코멘트에 연결된 로컬 작업 목록으로 해결 여부를 결정한다. 호출마다 독립적이다.
pub fn decide_resolution(mode: ResolutionMode, comment_id: i64, tasks: &[Task]) -> ResolutionResult {
    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.is_done()).count();
    let remaining = total - completed;

    let (resolve, message) = if comment_id == 0 {
        (false, "comment has no remote identity; nothing to resolve".to_string())
    } else {
        match mode {
            ResolutionMode::Disabled => (false, "auto-resolve disabled".to_string()),
            ResolutionMode::Immediate => (
                true,
                format!("resolving thread immediately ({completed}/{total} tasks done)"),
            ),
            ResolutionMode::Complete if total == 0 => {
                (false, "no local tasks tracked for comment".to_string())
            }
            ResolutionMode::Complete if completed == total => {
                (true, format!("all {total} tasks completed"))
            }
            ResolutionMode::Complete => (
                false,
                format!("{remaining} of {total} tasks remaining before resolve"),
            ),
        }
    };

    ResolutionResult {
        thread_resolved: resolve,
        comment_id,
        total_tasks: total,
        completed_tasks: completed,
        remaining_tasks: remaining,
        mode,
        message,
        should_notify: resolve,
    }
}
