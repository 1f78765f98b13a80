//! 상태 저장소: 세션 범위 key-value 저장
//!
//! 분석 결과 원본과 마지막 테스트 시각을 고정된 키로 보관합니다.
//! 조회 결과가 없으면 "이전 실행 없음"으로 취급합니다.
//!
//! - [`MemoryStore`]: 프로세스 수명 동안 유지되는 메모리 저장소
//! - [`JsonFileStore`]: 하나의 JSON 객체를 파일로 보관하는 저장소

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;
use crate::suite::BoxFuture;

/// 매니페스트 검증 결과 키
pub const MANIFEST_TESTS_KEY: &str = "manifest_tests";
/// Service Worker 검사 결과 키
pub const SERVICE_WORKER_TESTS_KEY: &str = "service_worker_tests";
/// 보안 검사 결과 키
pub const SECURITY_TESTS_KEY: &str = "security_tests";
/// 마지막 테스트 시각 키
pub const LAST_TESTED_KEY: &str = "last_tested";

/// key-value 저장소
pub trait StateStore: Send + Sync {
    /// 값을 조회합니다. 없으면 `Ok(None)`
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, StoreError>>;

    /// 값을 기록합니다. 기존 값은 덮어씁니다.
    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), StoreError>>;
}

/// 직렬화 가능한 값을 기록합니다.
pub async fn put_typed<T: Serialize + ?Sized>(
    store: &dyn StateStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value).map_err(|e| StoreError::Serialize(e.to_string()))?;
    store.set(key, value).await
}

/// 값을 조회해서 역직렬화합니다.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn StateStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Serialize(format!("{key}: {e}"))),
        None => Ok(None),
    }
}

/// 마지막 테스트 시각을 조회합니다.
pub async fn last_tested(store: &dyn StateStore) -> Result<Option<DateTime<Utc>>, StoreError> {
    get_typed(store, LAST_TESTED_KEY).await
}

/// 마지막 테스트 시각을 기록합니다.
pub async fn stamp_last_tested(
    store: &dyn StateStore,
    at: DateTime<Utc>,
) -> Result<(), StoreError> {
    put_typed(store, LAST_TESTED_KEY, &at).await
}

// ─── MemoryStore ─────────────────────────────────────────────────────

/// 메모리 저장소
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, StoreError>> {
        Box::pin(async move { Ok(self.entries.lock().await.get(key).cloned()) })
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.entries.lock().await.insert(key.to_owned(), value);
            Ok(())
        })
    }
}

// ─── JsonFileStore ───────────────────────────────────────────────────

/// JSON 파일 저장소
///
/// 쓰기마다 파일 전체를 다시 기록합니다. 파일이 없으면 빈 저장소로 취급합니다.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// 저장소 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StoreError::Corrupt {
                path: self.path.display().to_string(),
                reason: "expected a JSON object".to_owned(),
            }),
            Err(e) => Err(StoreError::Corrupt {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn write_all(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        let io_err = |e: std::io::Error| StoreError::Io {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let body =
            serde_json::to_string_pretty(map).map_err(|e| StoreError::Serialize(e.to_string()))?;
        tokio::fs::write(&self.path, body).await.map_err(io_err)
    }
}

impl StateStore for JsonFileStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, StoreError>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            Ok(self.read_all().await?.remove(key))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut map = self.read_all().await?;
            map.insert(key.to_owned(), value);
            self.write_all(&map).await?;
            debug!(path = %self.path.display(), key, "store entry written");
            Ok(())
        })
    }
}
