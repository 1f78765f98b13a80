//! 에러 타입: 도메인별 에러 정의

/// pwa-report 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 검증 스위트 실행 에러
    #[error("suite error: {0}")]
    Suite(#[from] SuiteError),

    /// 매니페스트 조회 에러
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// 상태 저장소 에러
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// 애널리틱스 sink 에러
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 검증 스위트 에러
///
/// 스위트가 실패해도 해당 카테고리만 빈 상태가 되며 다른 카테고리는 계속 진행됩니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuiteError {
    /// 매니페스트가 JSON 객체가 아님
    #[error("malformed manifest: {0}")]
    MalformedManifest(String),

    /// 대상 URL에 접근할 수 없음
    #[error("site unreachable: {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// 일반 실행 실패
    #[error("suite failed: {0}")]
    Failed(String),

    /// 새 분석 실행으로 대체되어 취소됨
    #[error("suite cancelled")]
    Cancelled,

    /// 스위트 태스크가 패닉으로 종료됨
    #[error("suite task panicked: {0}")]
    Panicked(String),
}

/// 매니페스트 조회 에러
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// 페이지 또는 매니페스트 요청 실패
    #[error("fetch failed: {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// 해석할 수 없는 URL
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// 상태 저장소 에러
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 저장소 파일 I/O 실패
    #[error("store io error: {path}: {reason}")]
    Io { path: String, reason: String },

    /// 값 직렬화/역직렬화 실패
    #[error("store serialization error: {0}")]
    Serialize(String),

    /// 저장소 파일 내용이 JSON 객체가 아님
    #[error("store file corrupt: {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

/// 애널리틱스 sink 에러
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// sink가 이벤트를 거부함
    #[error("event rejected: {0}")]
    Rejected(String),
}
