//! 검사기 에러 타입
//!
//! [`ProbeError`]는 네트워크 검사 중 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<ProbeError>` 구현을 통해 core의 [`SuiteError`]와 [`ResolveError`]로
//! 변환되어 오케스트레이터까지 `?` 연산자로 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **요청**: `Request` ([`RequestFailure`]로 원인 구분), `Status`, `BodyTooLarge`
//! - **해석**: `InvalidUrl`, `Decode`
//! - **초기화**: `Client`, `Pattern`

use std::fmt;

use pwa_report_core::error::{ResolveError, SuiteError};

/// 인증서 이외의 TLS 실패를 나타내는 에러 메시지 조각 (소문자)
const TLS_MARKERS: &[&str] = &[
    "tls",
    "handshake",
    "corrupt message",
    "fatal alert",
    "peer is incompatible",
    "peer misbehaved",
];

/// 요청 전송 실패 원인
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFailure {
    /// 인증서 검증 실패
    Certificate,
    /// 인증서 이외의 TLS 핸드셰이크 실패
    Tls,
    /// 타임아웃
    Timeout,
    /// 연결 실패 (DNS, 연결 거부, 연결 끊김)
    Connect,
    /// 그 밖의 실패
    Other,
}

impl RequestFailure {
    /// reqwest 에러와 원인 체인으로 실패 원인을 분류합니다.
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        let chain = std::iter::successors(Some(err as &dyn std::error::Error), |e| e.source())
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(": ");
        Self::from_chain(err.is_connect(), &chain)
    }

    fn from_chain(is_connect: bool, chain: &str) -> Self {
        let chain = chain.to_ascii_lowercase();
        if chain.contains("certificate") {
            Self::Certificate
        } else if TLS_MARKERS.iter().any(|marker| chain.contains(marker)) {
            Self::Tls
        } else if chain.contains("timed out") {
            Self::Timeout
        } else if is_connect {
            Self::Connect
        } else {
            Self::Other
        }
    }

    /// TLS 계층에서 발생한 실패인지
    pub fn is_tls(self) -> bool {
        matches!(self, Self::Certificate | Self::Tls)
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Certificate => "certificate",
            Self::Tls => "tls",
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// 검사기 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// 요청 전송 실패
    #[error("request failed ({kind}): {url}: {reason}")]
    Request {
        /// 요청 URL
        url: String,
        /// 실패 원인
        kind: RequestFailure,
        /// 실패 사유
        reason: String,
    },

    /// 성공이 아닌 HTTP 상태
    #[error("unexpected status {status}: {url}")]
    Status {
        /// 요청 URL
        url: String,
        /// HTTP 상태 코드
        status: u16,
    },

    /// 응답 본문 크기 초과
    #[error("response too large: {url} (max: {max} bytes)")]
    BodyTooLarge {
        /// 요청 URL
        url: String,
        /// 허용 최대 크기
        max: usize,
    },

    /// 해석할 수 없는 URL
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// 응답 본문 해석 실패
    #[error("decode failed: {url}: {reason}")]
    Decode {
        /// 요청 URL
        url: String,
        /// 실패 사유
        reason: String,
    },

    /// HTTP 클라이언트 생성 실패
    #[error("http client error: {0}")]
    Client(String),

    /// 정규식 컴파일 실패
    #[error("pattern error: {0}")]
    Pattern(String),
}

impl From<ProbeError> for SuiteError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::Request { url, reason, .. } => SuiteError::Unreachable { url, reason },
            ProbeError::Status { url, status } => SuiteError::Unreachable {
                url,
                reason: format!("status {status}"),
            },
            ProbeError::Decode { reason, .. } => SuiteError::MalformedManifest(reason),
            other => SuiteError::Failed(other.to_string()),
        }
    }
}

impl From<ProbeError> for ResolveError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::InvalidUrl(url) => ResolveError::InvalidUrl(url),
            ProbeError::Request { url, reason, .. } | ProbeError::Decode { url, reason } => {
                ResolveError::Fetch { url, reason }
            }
            ProbeError::Status { url, status } => ResolveError::Fetch {
                url,
                reason: format!("status {status}"),
            },
            ProbeError::BodyTooLarge { url, max } => ResolveError::Fetch {
                url,
                reason: format!("response larger than {max} bytes"),
            },
            ProbeError::Client(reason) | ProbeError::Pattern(reason) => ResolveError::Fetch {
                url: String::new(),
                reason,
            },
        }
    }
}
