//! pwa-report 검사기 크레이트
//!
//! 엔진이 사용하는 외부 협력자의 실제 구현을 제공합니다.
//!
//! # 모듈 구조
//!
//! - [`error`]: 검사기 에러 (`ProbeError`, `RequestFailure`)
//! - [`fetch`]: 설정이 적용된 HTTP 클라이언트 (`HttpFetcher`)
//! - [`html`]: 정규식 기반 HTML / 스크립트 스캐너 (`HtmlScanner`)
//! - [`resolver`]: 매니페스트 조회기 (`HttpManifestResolver`)
//! - [`rules`]: 내장 매니페스트 규칙 엔진 (`ManifestRuleEngine`)
//! - [`service_worker`]: Service Worker 검사 (`HttpServiceWorkerSuite`)
//! - [`security`]: 보안 검사 (`HttpSecuritySuite`)
//!
//! # 구성
//!
//! ```text
//! ProbesConfig --> HttpFetcher --+--> HttpManifestResolver
//!                                +--> HttpServiceWorkerSuite
//!                                +--> HttpSecuritySuite
//!
//! ManifestRuleEngine --> ManifestSuite (core)
//! ```

pub mod error;
pub mod fetch;
pub mod html;
pub mod resolver;
pub mod rules;
pub mod security;
pub mod service_worker;


// --- 주요 타입 re-export ---

pub use error::{ProbeError, RequestFailure};
pub use fetch::{Fetched, HttpFetcher, normalize_site_url};
pub use html::HtmlScanner;
pub use resolver::HttpManifestResolver;
pub use rules::ManifestRuleEngine;
pub use security::HttpSecuritySuite;
pub use service_worker::HttpServiceWorkerSuite;
