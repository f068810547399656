//! 로컬 작업 완료 이벤트를 원격 스레드 해결로 연결하는 유스케이스.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::application::context::CallContext;
use crate::application::ports::TaskStore;
use crate::application::usecases::thread_states::ThreadStateFetcher;
use crate::domain::policy::{ResolutionMode, ResolutionResult, decide_resolution};
use crate::domain::target::PullRequestRef;
use crate::domain::task::Task;
use crate::error::SyncError;

pub struct ResolveThreadUseCase<'a> {
    pub task_store: &'a dyn TaskStore,
    pub fetcher: ThreadStateFetcher<'a>,
    pub mode: ResolutionMode,
}

impl<'a> ResolveThreadUseCase<'a> {
    /// 작업의 원본 코멘트에 묶인 로컬 작업 수로 해결 여부를 판단한다.
    pub fn should_resolve_thread(&self, task: &Task) -> Result<ResolutionResult> {
        let tasks = self
            .task_store
            .tasks_by_source_comment_id(task.source_comment_id)
            .with_context(|| {
                format!("failed to load tasks for comment {}", task.source_comment_id)
            })?;
        Ok(decide_resolution(self.mode, task.source_comment_id, &tasks))
    }

    /// 판단 결과가 해결이면 스레드 ID를 찾아 resolve mutation을 보낸다.
    /// "아직 해결하지 않음"과 "스레드 없음"은 오류가 아니다.
    pub async fn resolve_thread_for_task(
        &self,
        ctx: &CallContext,
        task: &Task,
        owner: &str,
        repo: &str,
    ) -> Result<ResolutionResult> {
        let mut result = self.should_resolve_thread(task)?;
        if !result.thread_resolved {
            debug!(
                task = %task.id,
                comment_id = result.comment_id,
                mode = %result.mode,
                "thread not resolvable yet: {}",
                result.message
            );
            return Ok(result);
        }

        let pr = PullRequestRef::new(owner, repo, task.pr_number);
        let thread_id = match self
            .fetcher
            .get_review_thread_id(ctx, &pr, task.source_comment_id)
            .await
        {
            Ok(id) => id,
            Err(err) if SyncError::is_not_found(&err) => {
                debug!(pr = %pr, comment_id = result.comment_id, "no review thread for comment");
                result.thread_resolved = false;
                result.should_notify = false;
                result.message = format!(
                    "no review thread found for comment {}",
                    task.source_comment_id
                );
                return Ok(result);
            }
            Err(err) => return Err(err),
        };

        self.fetcher.resolve_review_thread(ctx, &thread_id).await?;
        info!(pr = %pr, thread_id = %thread_id, comment_id = result.comment_id, "review thread resolved");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::usecases::testing::{
        MemoryTaskStore, ScriptedGraphql, thread, threads_page,
    };
    use crate::application::usecases::thread_states::PageSizes;
    use crate::domain::task::TaskStatus;

    fn task(id: &str, comment_id: i64, status: TaskStatus) -> Task {
        Task {
            id: id.to_string(),
            description: format!("task {id}"),
            source_comment_id: comment_id,
            pr_number: 7,
            status,
        }
    }

    fn resolvable_graphql() -> ScriptedGraphql {
        let mut graphql = ScriptedGraphql::default();
        graphql.thread_pages.insert(
            None,
            threads_page(vec![thread("T_42", false, &[42], None)], None),
        );
        graphql.resolve_result = Some(json!({
            "resolveReviewThread": { "thread": { "id": "T_42", "isResolved": true } }
        }));
        graphql
    }

    #[tokio::test]
    async fn complete_mode_resolves_after_last_task() {
        let store = MemoryTaskStore::default();
        store.tasks.lock().unwrap().extend([
            task("a", 42, TaskStatus::Done),
            task("b", 42, TaskStatus::Done),
            task("c", 42, TaskStatus::Doing),
        ]);
        let graphql = resolvable_graphql();
        let use_case = ResolveThreadUseCase {
            task_store: &store,
            fetcher: ThreadStateFetcher::new(&graphql, PageSizes::default()),
            mode: ResolutionMode::Complete,
        };
        let ctx = CallContext::new();
        let trigger = task("b", 42, TaskStatus::Done);

        let first = use_case
            .resolve_thread_for_task(&ctx, &trigger, "acme", "widgets")
            .await
            .unwrap();
        assert!(!first.thread_resolved);
        assert_eq!(first.remaining_tasks, 1);
        assert_eq!(graphql.call_count(), 0);

        store.tasks.lock().unwrap()[2].status = TaskStatus::Done;
        let second = use_case
            .resolve_thread_for_task(&ctx, &trigger, "acme", "widgets")
            .await
            .unwrap();
        assert!(second.thread_resolved);
        assert!(second.should_notify);
        assert_eq!(graphql.call_count(), 2);
    }

    #[tokio::test]
    async fn missing_thread_is_not_an_error() {
        let store = MemoryTaskStore::default();
        store.tasks.lock().unwrap().push(task("a", 7, TaskStatus::Done));
        let graphql = resolvable_graphql();
        let use_case = ResolveThreadUseCase {
            task_store: &store,
            fetcher: ThreadStateFetcher::new(&graphql, PageSizes::default()),
            mode: ResolutionMode::Immediate,
        };

        let result = use_case
            .resolve_thread_for_task(&CallContext::new(), &task("a", 7, TaskStatus::Done), "acme", "widgets")
            .await
            .unwrap();
        assert!(!result.thread_resolved);
        assert!(result.message.contains("no review thread"));
    }

    #[tokio::test]
    async fn disabled_mode_never_calls_remote() {
        let store = MemoryTaskStore::default();
        store.tasks.lock().unwrap().push(task("a", 42, TaskStatus::Done));
        let graphql = resolvable_graphql();
        let use_case = ResolveThreadUseCase {
            task_store: &store,
            fetcher: ThreadStateFetcher::new(&graphql, PageSizes::default()),
            mode: ResolutionMode::Disabled,
        };

        let result = use_case
            .resolve_thread_for_task(&CallContext::new(), &task("a", 42, TaskStatus::Done), "acme", "widgets")
            .await
            .unwrap();
        assert!(!result.thread_resolved);
        assert_eq!(graphql.call_count(), 0);
    }

    #[tokio::test]
    async fn rejected_resolution_propagates() {
        let store = MemoryTaskStore::default();
        store.tasks.lock().unwrap().push(task("a", 42, TaskStatus::Done));
        let mut graphql = resolvable_graphql();
        graphql.resolve_result = Some(json!({ "resolveReviewThread": null }));
        let use_case = ResolveThreadUseCase {
            task_store: &store,
            fetcher: ThreadStateFetcher::new(&graphql, PageSizes::default()),
            mode: ResolutionMode::Immediate,
        };

        let err = use_case
            .resolve_thread_for_task(&CallContext::new(), &task("a", 42, TaskStatus::Done), "acme", "widgets")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::ResolveRejected { .. })
        ));
    }
}
