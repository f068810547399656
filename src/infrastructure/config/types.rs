//! 설정 스키마와 병합/해석 규칙.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::application::usecases::thread_states::{MAX_PAGE_SIZE, PageSizes};
use crate::domain::policy::ResolutionMode;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_TASK_DIR: &str = ".pr-review";
const FALLBACK_CACHE_DIR: &str = ".prsync/cache";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// 전역 기본값
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// 호스트별 인증/엔드포인트 설정
    #[serde(default)]
    pub hosts: HashMap<String, HostConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DefaultsConfig {
    /// 응답 캐시 디렉터리
    pub cache_dir: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    /// 스레드 목록 페이지 크기(1..=100)
    pub thread_page_size: Option<u32>,
    /// 스레드별 코멘트 페이지 크기(1..=100)
    pub comment_page_size: Option<u32>,
    /// immediate | complete | disabled
    pub resolution_mode: Option<String>,
    /// 로컬 작업 파일 루트
    pub task_dir: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HostConfig {
    pub token: Option<String>,
    pub token_env: Option<String>,
    pub api_base: Option<String>,
}

impl Config {
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.defaults.cache_dir {
            return PathBuf::from(dir);
        }
        dirs::cache_dir()
            .map(|base| base.join("prsync"))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIR))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.defaults.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS))
    }

    pub fn page_sizes(&self) -> PageSizes {
        PageSizes::new(
            self.defaults.thread_page_size.unwrap_or(MAX_PAGE_SIZE),
            self.defaults.comment_page_size.unwrap_or(MAX_PAGE_SIZE),
        )
    }

    /// 정책 모드는 여기서 한 번만 파싱한다. 알 수 없는 값은 오류.
    pub fn resolution_mode(&self) -> Result<ResolutionMode> {
        match self.defaults.resolution_mode.as_deref() {
            Some(raw) => Ok(raw.parse()?),
            None => Ok(ResolutionMode::default()),
        }
    }

    pub fn task_dir(&self) -> PathBuf {
        PathBuf::from(
            self.defaults
                .task_dir
                .as_deref()
                .unwrap_or(DEFAULT_TASK_DIR),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.defaults
                .request_timeout_ms
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        )
    }

    pub fn host_config(&self, host: &str) -> Option<&HostConfig> {
        self.hosts.get(host)
    }

    /// 후순위(나중 파일) 값으로 덮어쓰는 병합 규칙.
    pub(crate) fn merge_from(&mut self, other: Config) {
        self.defaults.merge_from(other.defaults);

        for (host, incoming) in other.hosts {
            if let Some(existing) = self.hosts.get_mut(&host) {
                existing.merge_from(incoming);
            } else {
                self.hosts.insert(host, incoming);
            }
        }
    }
}

impl DefaultsConfig {
    pub(crate) fn merge_from(&mut self, other: DefaultsConfig) {
        if other.cache_dir.is_some() {
            self.cache_dir = other.cache_dir;
        }
        if other.cache_ttl_secs.is_some() {
            self.cache_ttl_secs = other.cache_ttl_secs;
        }
        if other.thread_page_size.is_some() {
            self.thread_page_size = other.thread_page_size;
        }
        if other.comment_page_size.is_some() {
            self.comment_page_size = other.comment_page_size;
        }
        if other.resolution_mode.is_some() {
            self.resolution_mode = other.resolution_mode;
        }
        if other.task_dir.is_some() {
            self.task_dir = other.task_dir;
        }
        if other.request_timeout_ms.is_some() {
            self.request_timeout_ms = other.request_timeout_ms;
        }
    }
}

impl HostConfig {
    /// 인라인 토큰 우선, 없으면 환경변수에서 읽는다.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(token) = self.token.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            return Some(token.to_string());
        }
        let env_name = self.token_env.as_deref()?;
        env::var(env_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub(crate) fn merge_from(&mut self, other: HostConfig) {
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.token_env.is_some() {
            self.token_env = other.token_env;
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
    }
}
