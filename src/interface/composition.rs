//! 애플리케이션 조립(composition root) 모듈.

use std::env;

use anyhow::Result;
use tracing::debug;

use crate::application::usecases::compare_comments::CompareCommentsUseCase;
use crate::application::usecases::fetch_reviews::FetchReviewsUseCase;
use crate::application::usecases::resolve_thread::ResolveThreadUseCase;
use crate::application::usecases::thread_states::{PageSizes, ThreadStateFetcher};
use crate::application::usecases::track_resolution::ThreadResolutionTracker;
use crate::domain::policy::ResolutionMode;
use crate::infrastructure::cache::ResponseCache;
use crate::infrastructure::config::Config;
use crate::infrastructure::github::{GitHubConnection, GitHubGraphqlClient, GitHubRestClient};
use crate::infrastructure::tasks::JsonTaskStore;

const FALLBACK_TOKEN_ENVS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// 실행 시점 의존성을 한 곳에서 조립하는 컨테이너.
pub struct AppComposition {
    cache: ResponseCache,
    rest: GitHubRestClient,
    graphql: GitHubGraphqlClient,
    task_store: JsonTaskStore,
    page_sizes: PageSizes,
    mode: ResolutionMode,
}

impl AppComposition {
    /// 설정 파일을 병합 로딩한 뒤 호스트 하나에 대한 조립을 만든다.
    pub fn load(host: &str) -> Result<Self> {
        Self::from_config(&Config::load()?, host)
    }

    pub fn from_config(config: &Config, host: &str) -> Result<Self> {
        let host_cfg = config.host_config(host);
        let token = host_cfg
            .and_then(|cfg| cfg.resolve_token())
            .or_else(token_from_env);
        let api_base = host_cfg.and_then(|cfg| cfg.api_base.clone());
        debug!(host, authenticated = token.is_some(), "composing github adapters");

        let conn = GitHubConnection::new(
            host.to_string(),
            token,
            api_base,
            config.request_timeout(),
        )?;

        Ok(Self {
            cache: ResponseCache::new(config.cache_dir(), config.cache_ttl()),
            rest: GitHubRestClient::new(conn.clone()),
            graphql: GitHubGraphqlClient::new(conn),
            task_store: JsonTaskStore::new(config.task_dir()),
            page_sizes: config.page_sizes(),
            mode: config.resolution_mode()?,
        })
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn task_store(&self) -> &JsonTaskStore {
        &self.task_store
    }

    pub fn fetcher(&self) -> ThreadStateFetcher<'_> {
        ThreadStateFetcher::new(&self.graphql, self.page_sizes)
    }

    pub fn tracker(&self) -> ThreadResolutionTracker<'_> {
        ThreadResolutionTracker::new(self.fetcher())
    }

    pub fn fetch_reviews_usecase(&self) -> FetchReviewsUseCase<'_> {
        FetchReviewsUseCase {
            source: &self.rest,
            cache: Some(&self.cache),
        }
    }

    pub fn compare_usecase(&self) -> CompareCommentsUseCase<'_> {
        CompareCommentsUseCase {
            reviews: self.fetch_reviews_usecase(),
            tracker: self.tracker(),
        }
    }

    pub fn resolve_usecase(&self) -> ResolveThreadUseCase<'_> {
        ResolveThreadUseCase {
            task_store: &self.task_store,
            fetcher: self.fetcher(),
            mode: self.mode,
        }
    }
}

fn token_from_env() -> Option<String> {
    FALLBACK_TOKEN_ENVS.iter().find_map(|name| {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}
