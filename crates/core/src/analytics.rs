//! 애널리틱스: fire-and-forget 이벤트 sink
//!
//! sink 실패는 분석 결과에 영향을 주지 않습니다. [`record_checkpoint`]는
//! 에러를 로그로만 남기고 삼킵니다.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AnalyticsError;

/// 이벤트 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsBehavior {
    /// 사용 흐름의 체크포인트 (예: `retest_clicked`)
    ProcessCheckpoint,
    /// CLI 명령 실행
    Command,
}

/// 애널리틱스 이벤트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    /// 이벤트 이름
    pub name: String,
    /// 이벤트 분류
    pub behavior: AnalyticsBehavior,
    /// 부가 속성
    pub properties: BTreeMap<String, String>,
    /// 세션 ID
    pub session_id: Uuid,
    /// 발생 시각
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(name: impl Into<String>, behavior: AnalyticsBehavior, session_id: Uuid) -> Self {
        Self {
            name: name.into(),
            behavior,
            properties: BTreeMap::new(),
            session_id,
            timestamp: Utc::now(),
        }
    }

    /// 속성을 추가합니다.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// 이벤트 sink
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError>;
}

/// 체크포인트 이벤트를 기록합니다. sink 에러는 경고 로그로만 남깁니다.
pub fn record_checkpoint(sink: &dyn AnalyticsSink, session_id: Uuid, name: &str) {
    let event = AnalyticsEvent::new(name, AnalyticsBehavior::ProcessCheckpoint, session_id);
    if let Err(e) = sink.record(event) {
        warn!(event = name, error = %e, "analytics event dropped");
    }
}

/// `tracing` 이벤트로 기록하는 sink
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn record(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        let properties = serde_json::to_string(&event.properties)
            .map_err(|e| AnalyticsError::Rejected(e.to_string()))?;
        info!(
            target: "pwa_report::analytics",
            event = %event.name,
            behavior = ?event.behavior,
            session_id = %event.session_id,
            properties = %properties,
            "analytics event"
        );
        Ok(())
    }
}

/// 아무것도 기록하지 않는 sink
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn record(&self, _event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        Ok(())
    }
}
