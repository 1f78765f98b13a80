//! 설정 관리: pwa-report.toml 파싱 및 런타임 설정
//!
//! [`ReportConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`PWA_REPORT_ANALYSIS_PAGE_SIZE=10` 형식)
//! 3. 설정 파일 (`pwa-report.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), pwa_report_core::error::ReportError> {
//! use pwa_report_core::config::ReportConfig;
//!
//! let config = ReportConfig::load("pwa-report.toml").await?;
//! let config = ReportConfig::parse("[analysis]\npage_size = 10")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ReportError};

/// pwa-report 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 분석 엔진 설정
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// 상태 저장소 설정
    #[serde(default)]
    pub store: StoreConfig,
    /// 애널리틱스 설정
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    /// 네트워크 검사 설정
    #[serde(default)]
    pub probes: ProbesConfig,
}

impl ReportConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ReportError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ReportError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ReportError> {
        toml::from_str(toml_str).map_err(|e| {
            ReportError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `PWA_REPORT_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "PWA_REPORT_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "PWA_REPORT_GENERAL_LOG_FORMAT");

        // Analysis
        override_usize(&mut self.analysis.page_size, "PWA_REPORT_ANALYSIS_PAGE_SIZE");
        override_u64(
            &mut self.analysis.retest_delay_ms,
            "PWA_REPORT_ANALYSIS_RETEST_DELAY_MS",
        );
        override_u64(
            &mut self.analysis.last_tested_poll_secs,
            "PWA_REPORT_ANALYSIS_LAST_TESTED_POLL_SECS",
        );

        // Store
        override_string(&mut self.store.backend, "PWA_REPORT_STORE_BACKEND");
        override_string(&mut self.store.path, "PWA_REPORT_STORE_PATH");

        // Analytics
        override_bool(&mut self.analytics.enabled, "PWA_REPORT_ANALYTICS_ENABLED");

        // Probes
        override_u64(
            &mut self.probes.request_timeout_secs,
            "PWA_REPORT_PROBES_REQUEST_TIMEOUT_SECS",
        );
        override_string(&mut self.probes.user_agent, "PWA_REPORT_PROBES_USER_AGENT");
        override_usize(
            &mut self.probes.max_body_bytes,
            "PWA_REPORT_PROBES_MAX_BODY_BYTES",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ReportError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.analysis.page_size == 0 || self.analysis.page_size > 100 {
            return Err(ConfigError::InvalidValue {
                field: "analysis.page_size".to_owned(),
                reason: "must be between 1 and 100".to_owned(),
            }
            .into());
        }

        // 확인 지연은 UX 대기 시간이므로 1분을 넘지 않도록 제한
        if self.analysis.retest_delay_ms > 60_000 {
            return Err(ConfigError::InvalidValue {
                field: "analysis.retest_delay_ms".to_owned(),
                reason: "must be at most 60000".to_owned(),
            }
            .into());
        }

        if self.analysis.last_tested_poll_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analysis.last_tested_poll_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        let valid_backends = ["memory", "file"];
        if !valid_backends.contains(&self.store.backend.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "store.backend".to_owned(),
                reason: format!("must be one of: {}", valid_backends.join(", ")),
            }
            .into());
        }

        if self.store.backend == "file" && self.store.path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "store.path".to_owned(),
                reason: "path must not be empty when backend is file".to_owned(),
            }
            .into());
        }

        if self.probes.request_timeout_secs == 0 || self.probes.request_timeout_secs > 300 {
            return Err(ConfigError::InvalidValue {
                field: "probes.request_timeout_secs".to_owned(),
                reason: "must be between 1 and 300".to_owned(),
            }
            .into());
        }

        if self.probes.max_body_bytes < 1024 {
            return Err(ConfigError::InvalidValue {
                field: "probes.max_body_bytes".to_owned(),
                reason: "must be at least 1024".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 분석 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 할 일 목록 페이지 크기
    pub page_size: usize,
    /// 재검사 확인 후 실행까지의 지연 (밀리초)
    pub retest_delay_ms: u64,
    /// "마지막 테스트" 표시 갱신 주기 (초)
    pub last_tested_poll_secs: u64,
}

impl AnalysisConfig {
    pub fn retest_delay(&self) -> Duration {
        Duration::from_millis(self.retest_delay_ms)
    }

    pub fn last_tested_poll_interval(&self) -> Duration {
        Duration::from_secs(self.last_tested_poll_secs)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            page_size: 5,
            retest_delay_ms: 3000,
            last_tested_poll_secs: 120,
        }
    }
}

/// 상태 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 저장소 종류 (memory, file)
    pub backend: String,
    /// file 저장소 경로
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_owned(),
            path: ".pwa-report/session.json".to_owned(),
        }
    }
}

/// 애널리틱스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// 활성화 여부. 비활성화하면 이벤트를 버림
    pub enabled: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// 네트워크 검사 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbesConfig {
    /// HTTP 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 요청 User-Agent
    pub user_agent: String,
    /// 응답 본문 최대 크기 (바이트)
    pub max_body_bytes: usize,
}

impl ProbesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ProbesConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 15,
            user_agent: concat!("pwa-report/", env!("CARGO_PKG_VERSION")).to_owned(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
