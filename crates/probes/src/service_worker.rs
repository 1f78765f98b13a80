//! HTTP Service Worker 검사
//!
//! 페이지(또는 같은 출처의 스크립트)에서 `navigator.serviceWorker.register(...)`
//! 호출을 찾고, 등록된 스크립트를 받아 처리하는 이벤트를 확인합니다.
//! Service Worker가 없으면 실패한 required 결과 하나만 반환합니다.

use std::collections::BTreeSet;

use url::Url;

use pwa_report_core::{AnalysisKind, Category, CategorySuite, SuiteError, SuiteResults, SuiteTarget, TestResult};

use crate::error::ProbeError;
use crate::fetch::{Fetched, HttpFetcher, normalize_site_url};
use crate::html::HtmlScanner;

pub const HAS_SERVICE_WORKER: &str = "Has a Service Worker";
pub const HAS_OFFLINE_SUPPORT: &str = "Has offline support";
pub const HAS_BACKGROUND_SYNC: &str = "Has background sync";
pub const HAS_PERIODIC_SYNC: &str = "Has periodic background sync";
pub const HAS_PUSH: &str = "Has push notifications";

/// 등록 호출을 찾기 위해 살펴볼 외부 스크립트 수
const MAX_SCRIPTS_SCANNED: usize = 8;

/// Service Worker 스크립트가 처리하는 이벤트로 검사 결과를 만듭니다.
///
/// `None`은 Service Worker를 찾지 못했음을 뜻합니다.
pub fn service_worker_checks(handlers: Option<&BTreeSet<String>>) -> Vec<TestResult> {
    let Some(handlers) = handlers else {
        return vec![TestResult::new(Category::Required, false, HAS_SERVICE_WORKER)];
    };
    let handles = |event: &str| handlers.contains(event);

    vec![
        TestResult::new(Category::Required, true, HAS_SERVICE_WORKER),
        TestResult::new(Category::Recommended, handles("fetch"), HAS_OFFLINE_SUPPORT),
        TestResult::new(Category::Optional, handles("sync"), HAS_BACKGROUND_SYNC),
        TestResult::new(Category::Optional, handles("periodicsync"), HAS_PERIODIC_SYNC),
        TestResult::new(Category::Optional, handles("push"), HAS_PUSH),
    ]
}

pub struct HttpServiceWorkerSuite {
    fetcher: HttpFetcher,
    scanner: HtmlScanner,
}

impl HttpServiceWorkerSuite {
    pub fn new(fetcher: HttpFetcher) -> Result<Self, ProbeError> {
        Ok(Self {
            fetcher,
            scanner: HtmlScanner::new()?,
        })
    }

    /// 등록된 Service Worker 스크립트 URL
    async fn locate(&self, page: &Fetched) -> Option<Url> {
        if let Some(path) = self.scanner.service_worker_registration(&page.body) {
            return page.url.join(&path).ok();
        }

        let origin = page.url.origin();
        let scripts = self
            .scanner
            .script_sources(&page.body)
            .into_iter()
            .filter_map(|src| page.url.join(&src).ok())
            .filter(|url| url.origin() == origin)
            .take(MAX_SCRIPTS_SCANNED);

        for script_url in scripts {
            match self.fetcher.get_text(&script_url).await {
                // 등록 경로는 스크립트가 아닌 문서 기준으로 해석됩니다.
                Ok(script) => {
                    if let Some(path) = self.scanner.service_worker_registration(&script.body) {
                        return page.url.join(&path).ok();
                    }
                }
                Err(e) => tracing::debug!(script = %script_url, error = %e, "skipping script"),
            }
        }
        None
    }
}

impl CategorySuite for HttpServiceWorkerSuite {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::ServiceWorker
    }

    async fn evaluate(&self, target: &SuiteTarget) -> Result<SuiteResults, SuiteError> {
        let url = normalize_site_url(&target.url)?;
        let page = self.fetcher.get_text(&url).await?;

        let Some(worker_url) = self.locate(&page).await else {
            tracing::info!(url = %page.url, "no service worker registration found");
            return Ok(SuiteResults::Checks(service_worker_checks(None)));
        };

        let handlers = match self.fetcher.get_text(&worker_url).await {
            Ok(script) => Some(self.scanner.event_handlers(&script.body)),
            Err(e) => {
                tracing::warn!(worker = %worker_url, error = %e, "service worker script unavailable");
                None
            }
        };

        Ok(SuiteResults::Checks(service_worker_checks(handlers.as_ref())))
    }
}
