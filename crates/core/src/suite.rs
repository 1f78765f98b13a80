//! 검증 스위트 trait: 카테고리별 분석 인터페이스
//!
//! 세 가지 분석 카테고리(매니페스트, Service Worker, 보안)는 모두
//! [`CategorySuite`] 하나의 비동기 인터페이스로 통일됩니다.
//! 매니페스트 검증은 동기 규칙 엔진([`ManifestRules`])이지만
//! [`ManifestSuite`] 어댑터로 감싸서 같은 인터페이스로 실행됩니다.
//!
//! # 동적 디스패치
//! [`CategorySuite`]는 RPITIT(`impl Future`)를 사용하므로 dyn-compatible하지 않습니다.
//! 오케스트레이터는 [`DynSuite`]를 통해 `Arc<dyn DynSuite>`로 스위트를 보관합니다.

use std::future::Future;
use std::pin::Pin;

use crate::error::{ResolveError, SuiteError};
use crate::types::{
    AnalysisKind, Category, Manifest, ManifestContext, MissingField, TestResult, Validation,
};

/// 박싱된 Send future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 스위트 실행 대상
#[derive(Debug, Clone)]
pub struct SuiteTarget {
    /// 분석 대상 사이트 URL
    pub url: String,
    /// 조회되었거나 합성된 매니페스트
    pub manifest: ManifestContext,
    /// 매니페스트가 합성되었는지 여부
    pub created_manifest: bool,
}

/// 스위트 실행 결과
#[derive(Debug, Clone, PartialEq)]
pub enum SuiteResults {
    /// 매니페스트 멤버 검증 결과와 누락 필드
    Manifest {
        validations: Vec<Validation>,
        missing: Vec<MissingField>,
    },
    /// Service Worker / 보안 검사 결과
    Checks(Vec<TestResult>),
}

impl SuiteResults {
    /// 저장소에 기록할 원시 결과
    pub fn to_store_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Manifest { validations, .. } => serde_json::to_value(validations),
            Self::Checks(results) => serde_json::to_value(results),
        }
    }
}

/// 카테고리 검증 스위트
///
/// 구현체는 하나의 [`AnalysisKind`]를 담당하며, 에러는 해당 카테고리에만 영향을 줍니다.
///
/// # 구현 예시
/// ```ignore
/// struct AlwaysSecure;
///
/// impl CategorySuite for AlwaysSecure {
///     fn kind(&self) -> AnalysisKind { AnalysisKind::Security }
///
///     async fn evaluate(&self, _target: &SuiteTarget) -> Result<SuiteResults, SuiteError> {
///         Ok(SuiteResults::Checks(vec![
///             TestResult::new(Category::Required, true, "Uses HTTPS"),
///         ]))
///     }
/// }
/// ```
pub trait CategorySuite: Send + Sync {
    /// 담당 카테고리
    fn kind(&self) -> AnalysisKind;

    /// 대상에 대해 검사를 실행합니다.
    fn evaluate(
        &self,
        target: &SuiteTarget,
    ) -> impl Future<Output = Result<SuiteResults, SuiteError>> + Send;
}

/// dyn-compatible 스위트 trait
///
/// [`CategorySuite`]를 구현한 타입은 blanket implementation으로 자동 구현됩니다.
pub trait DynSuite: Send + Sync {
    /// 담당 카테고리
    fn kind(&self) -> AnalysisKind;

    /// 대상에 대해 검사를 실행합니다.
    fn evaluate<'a>(
        &'a self,
        target: &'a SuiteTarget,
    ) -> BoxFuture<'a, Result<SuiteResults, SuiteError>>;
}

impl<T: CategorySuite> DynSuite for T {
    fn kind(&self) -> AnalysisKind {
        CategorySuite::kind(self)
    }

    fn evaluate<'a>(
        &'a self,
        target: &'a SuiteTarget,
    ) -> BoxFuture<'a, Result<SuiteResults, SuiteError>> {
        Box::pin(CategorySuite::evaluate(self, target))
    }
}

/// 매니페스트 조회기
pub trait ManifestResolver: Send + Sync {
    /// 사이트의 매니페스트를 조회합니다. 찾지 못하면 `Ok(None)`을 반환합니다.
    fn fetch_or_create<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<Option<ManifestContext>, ResolveError>>;

    /// 매니페스트가 없을 때 사용할 빈 컨텍스트를 합성합니다.
    fn create_from_empty(&self, url: &str) -> ManifestContext {
        ManifestContext::empty(url)
    }
}

/// 동기 매니페스트 규칙 엔진
pub trait ManifestRules: Send + Sync {
    /// 매니페스트에 존재하는 멤버를 검증합니다.
    fn validate(&self, manifest: &Manifest) -> Result<Vec<Validation>, SuiteError>;

    /// 매니페스트에 없는 멤버 이름을 반환합니다.
    fn report_missing(&self, manifest: &Manifest) -> Result<Vec<String>, SuiteError>;

    /// 멤버가 속한 필드 목록의 중요도
    fn classify(&self, member: &str) -> Option<Category>;
}

/// [`ManifestRules`]를 [`CategorySuite`]로 감싸는 어댑터
pub struct ManifestSuite<R> {
    rules: R,
}

impl<R: ManifestRules> ManifestSuite<R> {
    /// 규칙 엔진으로 새 스위트를 생성합니다.
    pub fn new(rules: R) -> Self {
        Self { rules }
    }

    /// 동기적으로 검증합니다.
    pub fn evaluate_manifest(&self, manifest: &Manifest) -> Result<SuiteResults, SuiteError> {
        let validations = self.rules.validate(manifest)?;
        let missing = self
            .rules
            .report_missing(manifest)?
            .into_iter()
            .map(|member| MissingField {
                category: self.rules.classify(&member).unwrap_or(Category::Optional),
                member,
            })
            .collect();

        Ok(SuiteResults::Manifest {
            validations,
            missing,
        })
    }
}

impl<R: ManifestRules> CategorySuite for ManifestSuite<R> {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Manifest
    }

    async fn evaluate(&self, target: &SuiteTarget) -> Result<SuiteResults, SuiteError> {
        self.evaluate_manifest(&target.manifest.manifest)
    }
}
