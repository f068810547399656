//! TTL 기반 파일 응답 캐시.
//!
//! 키 하나당 파일 하나(`<root>/<key>.json`)에 `CacheEntry`를 JSON으로 저장한다.
//! 캐시는 가속 계층일 뿐 진실의 원천이 아니다. 같은 키에 대한 동시 쓰기는
//! 마지막 쓰기가 이기며, 읽기 실패/손상 항목은 모두 미스로 처리한다.

use std::fmt::Display;
use std::fs;
use std::future::Future;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::domain::fingerprint::hash_part;

/// 키 길이(128비트, hex 32자).
const KEY_BYTES: usize = 16;
const ENTRY_EXT: &str = "json";

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: Value,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Clone)]
pub struct ResponseCache {
    root: PathBuf,
    ttl: chrono::Duration,
    clock: Clock,
}

impl ResponseCache {
    pub fn new(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            clock: Arc::new(Utc::now),
        }
    }

    /// 테스트 등에서 시간을 직접 제어할 때 사용한다.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// (operation, owner, repo, params...)를 호출 순서대로 이어 붙여 고정 길이 해시로 만든다.
    /// 파라미터 순서가 다르면 다른 키가 된다.
    pub fn cache_key(
        operation: &str,
        owner: &str,
        repo: &str,
        params: &[&dyn Display],
    ) -> String {
        let mut hasher = Sha256::new();
        for part in [operation, owner, repo] {
            hash_part(&mut hasher, part);
        }
        for param in params {
            hash_part(&mut hasher, &param.to_string());
        }

        hex::encode(&hasher.finalize()[..KEY_BYTES])
    }

    /// 만료된 항목은 없는 것으로 보고 즉시 삭제한다. 읽기/디코드 실패도 미스다.
    pub fn get<T: DeserializeOwned>(
        &self,
        operation: &str,
        owner: &str,
        repo: &str,
        params: &[&dyn Display],
    ) -> Option<T> {
        let key = Self::cache_key(operation, owner, repo, params);
        self.load(operation, &key)
    }

    /// 기존 항목을 항상 덮어쓴다. 쓰기 오류는 호출자에게 전파한다.
    pub fn set<T: Serialize>(
        &self,
        operation: &str,
        owner: &str,
        repo: &str,
        value: &T,
        params: &[&dyn Display],
    ) -> Result<()> {
        let key = Self::cache_key(operation, owner, repo, params);
        let payload = serde_json::to_value(value).context("failed to serialize cache payload")?;
        self.store(operation, &key, payload)
    }

    /// `get`을 블로킹 풀에서 실행한다. 작업이 실패해도 미스로 본다.
    pub fn get_async<T>(
        &self,
        operation: &str,
        owner: &str,
        repo: &str,
        params: &[&dyn Display],
    ) -> impl Future<Output = Option<T>> + Send + use<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let key = Self::cache_key(operation, owner, repo, params);
        let operation = operation.to_string();
        let cache = self.clone();
        async move {
            match tokio::task::spawn_blocking(move || cache.load(&operation, &key)).await {
                Ok(hit) => hit,
                Err(err) => {
                    debug!(%err, "cache read task failed; treating as miss");
                    None
                }
            }
        }
    }

    /// `set`을 블로킹 풀에서 실행한다.
    pub fn set_async<T: Serialize>(
        &self,
        operation: &str,
        owner: &str,
        repo: &str,
        value: &T,
        params: &[&dyn Display],
    ) -> impl Future<Output = Result<()>> + Send + use<T> {
        let key = Self::cache_key(operation, owner, repo, params);
        let payload = serde_json::to_value(value);
        let operation = operation.to_string();
        let cache = self.clone();
        async move {
            let payload = payload.context("failed to serialize cache payload")?;
            tokio::task::spawn_blocking(move || cache.store(&operation, &key, payload))
                .await
                .context("cache write task failed")?
        }
    }

    fn load<T: DeserializeOwned>(&self, operation: &str, key: &str) -> Option<T> {
        let path = self.entry_path(key);

        let entry = read_entry(&path)?;
        if entry.is_expired((self.clock)()) {
            debug!(operation, key = %key, "cache entry expired");
            let _ = fs::remove_file(&path);
            return None;
        }

        match serde_json::from_value(entry.payload) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(operation, key = %key, %err, "cache payload did not decode; treating as miss");
                None
            }
        }
    }

    fn store(&self, operation: &str, key: &str, payload: Value) -> Result<()> {
        let now = (self.clock)();
        let entry = CacheEntry {
            payload,
            cached_at: now,
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create cache dir {}", self.root.display()))?;

        // 쓰기마다 고유한 임시 파일에 쓴 뒤 rename한다. 같은 키의 동시 쓰기는 마지막 rename이 이긴다.
        let path = self.entry_path(key);
        let mut tmp = NamedTempFile::new_in(&self.root)
            .with_context(|| format!("failed to create temp file in {}", self.root.display()))?;
        tmp.write_all(&serde_json::to_vec(&entry)?)
            .with_context(|| format!("failed to write cache entry {}", tmp.path().display()))?;
        tmp.persist(&path)
            .map_err(|err| err.error)
            .with_context(|| format!("failed to store cache entry {}", path.display()))?;

        debug!(operation, key = %key, "cache entry stored");
        Ok(())
    }

    /// 캐시 항목 파일을 모두 삭제한다.
    pub fn clear(&self) -> Result<()> {
        for path in self.entry_files()? {
            remove_entry(&path)?;
        }
        Ok(())
    }

    /// 만료되었거나 읽을 수 없는 항목만 삭제한다.
    pub fn clear_expired(&self) -> Result<()> {
        let now = (self.clock)();
        let mut removed = 0usize;
        for path in self.entry_files()? {
            let stale = read_entry(&path).is_none_or(|entry| entry.is_expired(now));
            if stale {
                remove_entry(&path)?;
                removed += 1;
            }
        }
        debug!(removed, "expired cache entries purged");
        Ok(())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{ENTRY_EXT}"))
    }

    fn entry_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let dir = fs::read_dir(&self.root)
            .with_context(|| format!("failed to read cache dir {}", self.root.display()))?;
        for item in dir {
            let path = item?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == ENTRY_EXT) {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// 다른 쪽이 먼저 지운 항목은 이미 삭제된 것으로 본다.
fn remove_entry(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != ErrorKind::NotFound => Err(err)
            .with_context(|| format!("failed to remove cache entry {}", path.display())),
        _ => Ok(()),
    }
}

fn read_entry(path: &Path) -> Option<CacheEntry> {
    let raw = fs::read(path).ok()?;
    serde_json::from_slice(&raw).ok()
}
