//! pwa-report engine.
//!
//! Given a URL, runs the manifest, service-worker and security suites
//! concurrently, aggregates their scores, derives a todo list, and supports
//! confirmation-gated retesting.
//!
//! # Modules
//!
//! - [`score`]: pure tallies per category
//! - [`todo`]: todo item construction
//! - [`orchestrator`]: concurrent run execution and state publication
//! - [`pager`]: canonical ordering and pagination
//! - [`retest`]: retest state machine
//! - [`report`]: verdicts, colours, app card, icons, last-tested label
//! - [`session`]: [`ReportSession`] combining all of the above

pub mod error;
pub mod orchestrator;
pub mod pager;
pub mod report;
pub mod retest;
pub mod score;
pub mod session;
pub mod todo;

pub use error::{EngineError, RetestError};
pub use orchestrator::{AnalysisRun, CategoryOutcome, Orchestrator, OrchestratorBuilder, RunPhase};
pub use pager::{IndicatorCounts, PageDot, TodoPager, sort_todos, sorted_todos};
pub use report::{AppCard, ScoreColor, Verdict, decide_color, decide_verdict, verdict_message};
pub use retest::{RetestController, RetestState};
pub use score::{CategoryScore, ScoreTally};
pub use session::{ReportSession, TodoAction, watch_last_tested};
pub use todo::{TodoItem, TodoStatus};
