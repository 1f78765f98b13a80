//! HTTP 보안 검사
//!
//! HTTPS 사용, 인증서 검증 통과, 혼합 콘텐츠 부재를 확인합니다.
//! TLS 계층에서 요청이 실패하면 검증을 끈 클라이언트로 한 번 더 요청해
//! 사이트 자체에 접근할 수 없는 경우와 구분합니다. 타임아웃이나 연결 실패는
//! 다시 시도하지 않고 그대로 에러로 반환합니다.

use url::Url;

use pwa_report_core::{AnalysisKind, Category, CategorySuite, SuiteError, SuiteResults, SuiteTarget, TestResult};

use crate::error::ProbeError;
use crate::fetch::{HttpFetcher, normalize_site_url};
use crate::html::HtmlScanner;

pub const USES_HTTPS: &str = "Uses HTTPS";
pub const VALID_CERTIFICATE: &str = "Has valid SSL certificate";
pub const NO_MIXED_CONTENT: &str = "No mixed content on page";

/// 페이지 관찰 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityObservation {
    /// 최종 URL이 https인지
    pub https: bool,
    /// 인증서 검증을 통과했는지
    pub certificate_valid: bool,
    /// `http://`로 불러오는 하위 리소스
    pub insecure_resources: Vec<String>,
}

/// 관찰 결과로 검사 결과를 만듭니다.
pub fn security_checks(observation: &SecurityObservation) -> Vec<TestResult> {
    let https = observation.https;
    vec![
        TestResult::new(Category::Required, https, USES_HTTPS),
        TestResult::new(
            Category::Required,
            https && observation.certificate_valid,
            VALID_CERTIFICATE,
        ),
        TestResult::new(
            Category::Required,
            https && observation.insecure_resources.is_empty(),
            NO_MIXED_CONTENT,
        ),
    ]
}

pub struct HttpSecuritySuite {
    fetcher: HttpFetcher,
    unverified: HttpFetcher,
    scanner: HtmlScanner,
}

impl HttpSecuritySuite {
    /// `unverified`는 인증서 검증을 끈 클라이언트입니다.
    pub fn new(fetcher: HttpFetcher, unverified: HttpFetcher) -> Result<Self, ProbeError> {
        Ok(Self {
            fetcher,
            unverified,
            scanner: HtmlScanner::new()?,
        })
    }

    async fn observe(&self, url: &Url) -> Result<SecurityObservation, ProbeError> {
        let (page, certificate_valid) = match self.fetcher.get_text(url).await {
            Ok(page) => (page, true),
            Err(ProbeError::Request { url: failed, kind, reason })
                if kind.is_tls() && url.scheme() == "https" =>
            {
                tracing::debug!(url = %failed, %kind, reason = %reason, "verified request failed, retrying unverified");
                // 검증 없이도 실패하면 접근 불가로 처리합니다.
                let page = self.unverified.get_text(url).await?;
                tracing::warn!(url = %failed, "certificate validation failed");
                (page, false)
            }
            Err(e) => return Err(e),
        };

        let insecure_resources = self.scanner.insecure_subresources(&page.body);
        if !insecure_resources.is_empty() {
            tracing::info!(url = %page.url, count = insecure_resources.len(), "mixed content found");
        }

        Ok(SecurityObservation {
            https: page.url.scheme() == "https",
            certificate_valid,
            insecure_resources,
        })
    }
}

impl CategorySuite for HttpSecuritySuite {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Security
    }

    async fn evaluate(&self, target: &SuiteTarget) -> Result<SuiteResults, SuiteError> {
        let url = normalize_site_url(&target.url)?;
        let observation = self.observe(&url).await?;
        Ok(SuiteResults::Checks(security_checks(&observation)))
    }
}
