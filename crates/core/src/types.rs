//! 도메인 타입: 분석 엔진 전역에서 사용되는 공통 타입
//!
//! 검증 스위트가 생산하는 결과와 매니페스트 데이터 구조를 정의합니다.
//! 모든 결과 타입은 생산된 뒤 변경되지 않으며, 저장소에 JSON 그대로 기록됩니다.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store;

/// 검사 항목의 중요도
///
/// `Required` 실패는 패키징을 막습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// 필수 항목
    Required,
    /// 권장 항목
    Recommended,
    /// 선택 항목
    Optional,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Recommended => write!(f, "recommended"),
            Self::Optional => write!(f, "optional"),
        }
    }
}

/// 분석 카테고리 (독립된 검증 스위트 단위)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Web App Manifest 검증
    Manifest,
    /// Service Worker 기능 검사
    ServiceWorker,
    /// HTTPS 보안 검사
    Security,
}

impl AnalysisKind {
    /// 보고 순서대로 정렬된 전체 카테고리
    pub const ALL: [AnalysisKind; 3] = [Self::Manifest, Self::ServiceWorker, Self::Security];

    /// `can_package_list` 인덱스
    pub fn index(self) -> usize {
        match self {
            Self::Manifest => 0,
            Self::ServiceWorker => 1,
            Self::Security => 2,
        }
    }

    /// 할 일 항목이 가리키는 상세 섹션 ID
    pub fn card_id(self) -> &'static str {
        match self {
            Self::Manifest => "mani-details",
            Self::ServiceWorker => "sw-details",
            Self::Security => "sec-details",
        }
    }

    /// 원시 결과를 저장하는 저장소 키
    pub fn store_key(self) -> &'static str {
        match self {
            Self::Manifest => store::MANIFEST_TESTS_KEY,
            Self::ServiceWorker => store::SERVICE_WORKER_TESTS_KEY,
            Self::Security => store::SECURITY_TESTS_KEY,
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manifest => write!(f, "manifest"),
            Self::ServiceWorker => write!(f, "service_worker"),
            Self::Security => write!(f, "security"),
        }
    }
}

/// Service Worker / 보안 검사 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// 중요도
    pub category: Category,
    /// 통과 여부
    pub result: bool,
    /// 검사 설명 (할 일 항목의 필드/수정 문구로도 사용)
    pub info_string: String,
}

impl TestResult {
    /// 새 검사 결과를 생성합니다.
    pub fn new(category: Category, result: bool, info_string: impl Into<String>) -> Self {
        Self {
            category,
            result,
            info_string: info_string.into(),
        }
    }
}

/// 매니페스트 멤버 검증 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    /// 검증 대상 멤버명 (예: `"short_name"`)
    pub member: String,
    /// 통과 여부
    pub valid: bool,
    /// 중요도
    pub category: Category,
    /// 중요도와 무관하게 실패 시 패키징을 막는 검사인지 여부
    #[serde(default)]
    pub test_required: bool,
    /// 표시 문구
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_string: Option<String>,
    /// 실패 시 수정 안내 문구
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_string: Option<String>,
}

/// 매니페스트에 아예 없는 멤버
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingField {
    /// 멤버명
    pub member: String,
    /// 멤버가 속한 필드 목록의 중요도
    pub category: Category,
}

/// Web App Manifest
///
/// 임의의 멤버를 담을 수 있도록 JSON 값을 그대로 보관합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(Value);

impl Default for Manifest {
    fn default() -> Self {
        Self::empty()
    }
}

impl Manifest {
    /// 멤버가 없는 빈 매니페스트를 생성합니다.
    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// JSON 값에서 매니페스트를 생성합니다. 객체가 아니어도 그대로 보관합니다.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// JSON 문자열을 파싱합니다.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw).map(Self)
    }

    /// 원본 JSON 값
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// 최상위 객체. 매니페스트가 객체가 아니면 `None`
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }

    /// 멤버 값을 조회합니다.
    pub fn member(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(name))
    }

    /// 멤버가 존재하고 `null`이 아닌지 확인합니다.
    pub fn has_member(&self, name: &str) -> bool {
        self.member(name).is_some_and(|v| !v.is_null())
    }

    /// 비어 있지 않은 문자열 멤버를 조회합니다.
    pub fn str_member(&self, name: &str) -> Option<&str> {
        self.member(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.str_member("name")
    }

    pub fn short_name(&self) -> Option<&str> {
        self.str_member("short_name")
    }

    pub fn description(&self) -> Option<&str> {
        self.str_member("description")
    }

    pub fn theme_color(&self) -> Option<&str> {
        self.str_member("theme_color")
    }

    pub fn start_url(&self) -> Option<&str> {
        self.str_member("start_url")
    }

    /// `icons` 배열에서 형식이 올바른 아이콘만 반환합니다.
    pub fn icons(&self) -> Vec<Icon> {
        self.member("icons")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value::<Icon>(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// 매니페스트 아이콘 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    /// 이미지 경로 (상대 경로, 절대 URL, data URL)
    pub src: String,
    /// 공백 구분 크기 목록 (예: `"192x192 512x512"`)
    #[serde(default)]
    pub sizes: Option<String>,
    /// 용도 (예: `"any maskable"`)
    #[serde(default)]
    pub purpose: Option<String>,
    /// MIME 타입
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
}

impl Icon {
    /// `sizes`를 (가로, 세로) 목록으로 파싱합니다. 형식이 틀린 항목은 무시합니다.
    pub fn dimensions(&self) -> Vec<(u32, u32)> {
        self.sizes
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .filter_map(|size| {
                let (w, h) = size.to_ascii_lowercase().split_once('x').map(|(w, h)| {
                    (w.parse::<u32>(), h.parse::<u32>())
                })?;
                Some((w.ok()?, h.ok()?))
            })
            .collect()
    }

    /// base64 data URL 여부
    pub fn is_inline_data(&self) -> bool {
        self.src.starts_with("data:") && self.src.contains("base64")
    }
}

/// 조회되었거나 합성된 매니페스트와 그 출처
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestContext {
    /// 매니페스트 내용
    pub manifest: Manifest,
    /// 매니페스트 파일 URL (합성된 경우 `None`)
    pub manifest_url: Option<String>,
    /// 분석 대상 사이트 URL
    pub site_url: String,
}

impl ManifestContext {
    /// 사이트에서 매니페스트를 찾지 못했을 때 사용하는 빈 컨텍스트
    pub fn empty(site_url: impl Into<String>) -> Self {
        Self {
            manifest: Manifest::empty(),
            manifest_url: None,
            site_url: site_url.into(),
        }
    }
}
