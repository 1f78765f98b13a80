//! pwa-report 공통 크레이트
//!
//! 사이트 분석 엔진이 공유하는 도메인 타입, 에러, 설정, 그리고
//! 외부 협력자(검증 스위트, 매니페스트 리졸버, 상태 저장소, 애널리틱스) trait을 정의합니다.
//!
//! # 모듈 구조
//!
//! - [`types`]: 테스트 결과, 매니페스트, 분석 카테고리
//! - [`suite`]: 카테고리별 검증 스위트 trait (`CategorySuite`, `DynSuite`)
//! - [`store`]: 세션 범위 key-value 저장소 (`StateStore`)
//! - [`analytics`]: fire-and-forget 이벤트 sink (`AnalyticsSink`)
//! - [`config`]: `pwa-report.toml` 설정
//! - [`error`]: 도메인 에러
//! - [`metrics`]: 메트릭 이름 상수

pub mod analytics;
pub mod config;
pub mod error;
pub mod metrics;
pub mod store;
pub mod suite;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{
    AnalyticsError, ConfigError, ReportError, ResolveError, StoreError, SuiteError,
};

// 설정
pub use config::ReportConfig;

// 협력자 trait
pub use analytics::{AnalyticsBehavior, AnalyticsEvent, AnalyticsSink};
pub use store::StateStore;
pub use suite::{
    BoxFuture, CategorySuite, DynSuite, ManifestResolver, ManifestRules, ManifestSuite,
    SuiteResults, SuiteTarget,
};

// 도메인 타입
pub use types::{
    AnalysisKind, Category, Icon, Manifest, ManifestContext, MissingField, TestResult, Validation,
};
