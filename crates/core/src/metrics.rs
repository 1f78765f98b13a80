//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `pwa_report_`
//! - 영역: `analysis_`, `suite_`, `todo_`, `retest_`, `probe_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(pwa_report_core::metrics::ANALYSIS_RUNS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 분석 카테고리 레이블 키 (manifest, service_worker, security)
pub const LABEL_CATEGORY: &str = "category";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── 분석 실행 메트릭 ──────────────────────────────────────────────

/// 시작된 분석 실행 수 (counter)
pub const ANALYSIS_RUNS_TOTAL: &str = "pwa_report_analysis_runs_total";

/// 분석 실행 전체 소요 시간 (histogram, 초)
pub const ANALYSIS_DURATION_SECONDS: &str = "pwa_report_analysis_duration_seconds";

/// 새 실행에 밀려 버려진 스위트 결과 수 (counter)
pub const ANALYSIS_STALE_OUTCOMES_TOTAL: &str = "pwa_report_analysis_stale_outcomes_total";

// ─── 스위트 메트릭 ─────────────────────────────────────────────────

/// 실패한 스위트 실행 수 (counter, label: category)
pub const SUITE_FAILURES_TOTAL: &str = "pwa_report_suite_failures_total";

/// 스위트 소요 시간 (histogram, 초, label: category)
pub const SUITE_DURATION_SECONDS: &str = "pwa_report_suite_duration_seconds";

// ─── 할 일 / 재검사 메트릭 ─────────────────────────────────────────

/// 현재 할 일 항목 수 (gauge)
pub const TODO_ITEMS: &str = "pwa_report_todo_items";

/// 재검사 실행 수 (counter)
pub const RETESTS_TOTAL: &str = "pwa_report_retests_total";

// ─── 네트워크 검사 메트릭 ──────────────────────────────────────────

/// HTTP 요청 수 (counter, label: result)
pub const PROBE_REQUESTS_TOTAL: &str = "pwa_report_probe_requests_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// recorder가 설치되지 않았으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(ANALYSIS_RUNS_TOTAL, "Total number of analysis runs started");
    describe_histogram!(
        ANALYSIS_DURATION_SECONDS,
        "End-to-end analysis run duration in seconds"
    );
    describe_counter!(
        ANALYSIS_STALE_OUTCOMES_TOTAL,
        "Suite outcomes discarded because a newer run superseded them"
    );
    describe_counter!(
        SUITE_FAILURES_TOTAL,
        "Suite executions that returned an error or panicked, per category"
    );
    describe_histogram!(
        SUITE_DURATION_SECONDS,
        "Suite execution latency in seconds, per category"
    );
    describe_gauge!(TODO_ITEMS, "Number of todo items in the latest report");
    describe_counter!(RETESTS_TOTAL, "Total number of retests executed");
    describe_counter!(
        PROBE_REQUESTS_TOTAL,
        "HTTP requests issued by network probes, by result"
    );
}
