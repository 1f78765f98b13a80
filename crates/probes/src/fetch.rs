//! HTTP 요청 공통 처리
//!
//! 모든 검사기는 [`HttpFetcher`] 하나를 공유합니다. 타임아웃, User-Agent,
//! 응답 본문 크기 제한은 [`ProbesConfig`]에서 가져옵니다.

use metrics::counter;
use url::Url;

use pwa_report_core::config::ProbesConfig;
use pwa_report_core::metrics as m;

use crate::error::{ProbeError, RequestFailure};

/// 텍스트로 읽은 응답
#[derive(Debug, Clone)]
pub struct Fetched {
    /// 리다이렉트 이후 최종 URL
    pub url: Url,
    /// HTTP 상태 코드
    pub status: u16,
    /// 응답 본문 (UTF-8 손실 변환)
    pub body: String,
}

/// 설정이 적용된 HTTP 클라이언트
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// 설정으로 클라이언트를 생성합니다.
    pub fn from_config(config: &ProbesConfig) -> Result<Self, ProbeError> {
        Self::build(config, false)
    }

    /// 인증서 검증을 끈 클라이언트. 보안 검사에서 인증서 실패와 접근 불가를
    /// 구분할 때만 사용합니다.
    pub fn unverified_from_config(config: &ProbesConfig) -> Result<Self, ProbeError> {
        Self::build(config, true)
    }

    fn build(config: &ProbesConfig, accept_invalid_certs: bool) -> Result<Self, ProbeError> {
        Self::from_builder(client_builder(config, accept_invalid_certs), config)
    }

    /// 시스템 프록시를 거치지 않는 클라이언트. 로컬 테스트 서버 전용입니다.
    #[cfg(test)]
    pub(crate) fn direct(config: &ProbesConfig, accept_invalid_certs: bool) -> Result<Self, ProbeError> {
        Self::from_builder(client_builder(config, accept_invalid_certs).no_proxy(), config)
    }

    fn from_builder(builder: reqwest::ClientBuilder, config: &ProbesConfig) -> Result<Self, ProbeError> {
        let client = builder
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// GET 요청 후 본문을 텍스트로 읽습니다.
    ///
    /// 2xx가 아닌 상태는 [`ProbeError::Status`]로 반환합니다.
    pub async fn get_text(&self, url: &Url) -> Result<Fetched, ProbeError> {
        let result = self.get_text_inner(url).await;
        let outcome = if result.is_ok() { "success" } else { "failure" };
        counter!(m::PROBE_REQUESTS_TOTAL, m::LABEL_RESULT => outcome).increment(1);
        result
    }

    async fn get_text_inner(&self, url: &Url) -> Result<Fetched, ProbeError> {
        tracing::debug!(url = %url, "fetching");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ProbeError::Request {
                url: url.to_string(),
                kind: RequestFailure::classify(&e),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let final_url = response.url().clone();
        if !status.is_success() {
            return Err(ProbeError::Status {
                url: final_url.to_string(),
                status: status.as_u16(),
            });
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes as u64)
        {
            return Err(self.too_large(&final_url));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| ProbeError::Request {
            url: final_url.to_string(),
            kind: RequestFailure::classify(&e),
            reason: e.to_string(),
        })? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(self.too_large(&final_url));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(Fetched {
            url: final_url,
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    fn too_large(&self, url: &Url) -> ProbeError {
        ProbeError::BodyTooLarge {
            url: url.to_string(),
            max: self.max_body_bytes,
        }
    }
}

fn client_builder(config: &ProbesConfig, accept_invalid_certs: bool) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .user_agent(config.user_agent.clone())
        .danger_accept_invalid_certs(accept_invalid_certs)
}

/// 사용자가 입력한 사이트 주소를 URL로 해석합니다.
///
/// 스킴이 없으면 `https://`를 붙입니다. http/https 이외의 스킴은 거부합니다.
pub fn normalize_site_url(input: &str) -> Result<Url, ProbeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ProbeError::InvalidUrl(input.to_owned()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|e| ProbeError::InvalidUrl(format!("{input}: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(ProbeError::InvalidUrl(input.to_owned())),
    }
}
