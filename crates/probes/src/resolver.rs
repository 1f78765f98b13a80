//! HTTP 매니페스트 조회기
//!
//! 사이트 페이지를 받아 `<link rel="manifest">`를 찾고, 링크를 페이지 URL 기준으로
//! 해석한 뒤 매니페스트 JSON을 받아옵니다. 링크가 없거나 문서를 쓸 수 없으면
//! `Ok(None)`을 반환하고, 오케스트레이터가 빈 매니페스트를 합성합니다.

use url::Url;

use pwa_report_core::error::ResolveError;
use pwa_report_core::{BoxFuture, Manifest, ManifestContext, ManifestResolver};

use crate::error::ProbeError;
use crate::fetch::{HttpFetcher, normalize_site_url};
use crate::html::HtmlScanner;

pub struct HttpManifestResolver {
    fetcher: HttpFetcher,
    scanner: HtmlScanner,
}

impl HttpManifestResolver {
    pub fn new(fetcher: HttpFetcher) -> Result<Self, ProbeError> {
        Ok(Self {
            fetcher,
            scanner: HtmlScanner::new()?,
        })
    }

    async fn resolve(&self, site: &str) -> Result<Option<ManifestContext>, ProbeError> {
        let url = normalize_site_url(site)?;
        let page = self.fetcher.get_text(&url).await?;

        let Some(manifest_url) = manifest_link(&self.scanner, &page.url, &page.body) else {
            tracing::info!(url = %page.url, "no manifest link found");
            return Ok(None);
        };

        let fetched = match self.fetcher.get_text(&manifest_url).await {
            Ok(fetched) => fetched,
            Err(ProbeError::Status { url, status }) => {
                tracing::warn!(manifest_url = %url, status, "manifest link is broken");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let Some(manifest) = parse_manifest(&fetched.body) else {
            tracing::warn!(manifest_url = %manifest_url, "manifest is not a JSON object");
            return Ok(None);
        };

        tracing::debug!(manifest_url = %manifest_url, "manifest resolved");
        Ok(Some(ManifestContext {
            manifest,
            manifest_url: Some(fetched.url.to_string()),
            site_url: site.to_owned(),
        }))
    }
}

impl ManifestResolver for HttpManifestResolver {
    fn fetch_or_create<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<Option<ManifestContext>, ResolveError>> {
        Box::pin(async move { self.resolve(url).await.map_err(ResolveError::from) })
    }
}

/// 페이지에서 찾은 매니페스트 링크의 절대 URL
pub fn manifest_link(scanner: &HtmlScanner, page_url: &Url, html: &str) -> Option<Url> {
    let href = scanner.manifest_href(html)?;
    match page_url.join(&href) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(href = %href, error = %e, "unresolvable manifest link");
            None
        }
    }
}

/// JSON 객체일 때만 매니페스트로 해석합니다.
pub fn parse_manifest(body: &str) -> Option<Manifest> {
    let body = body.trim_start_matches('\u{feff}');
    Manifest::from_json(body)
        .ok()
        .filter(|manifest| manifest.as_object().is_some())
}
