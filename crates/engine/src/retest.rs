//! Confirmation-gated retest state machine.
//!
//! ```text
//! Ready ──request_confirmation──▶ AwaitingConfirmation ──confirm──▶ Confirmed
//!   ▲  │                                │ decline                    │
//!   │  └──────────────begin_reset───────┼────────────────────────────┤
//!   │                                   ▼                            ▼
//!   └──finish── Running ◀──begin_run── Resetting ◀───────begin_reset─┘
//! ```
//!
//! The controller holds no timers; the session applies the confirmation
//! delay between `confirm` and `begin_reset`.

use std::fmt;

use crate::error::RetestError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RetestState {
    #[default]
    Ready,
    /// The user said they deployed `thing_to_add` and must confirm the rerun.
    AwaitingConfirmation { thing_to_add: String },
    Confirmed,
    Resetting,
    Running,
}

impl RetestState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::AwaitingConfirmation { .. } => "awaiting confirmation",
            Self::Confirmed => "confirmed",
            Self::Resetting => "resetting",
            Self::Running => "running",
        }
    }
}

impl fmt::Display for RetestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Default)]
pub struct RetestController {
    state: RetestState,
}

impl RetestController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RetestState {
        &self.state
    }

    /// True while a confirmation surface should be visible.
    pub fn is_awaiting_confirmation(&self) -> bool {
        matches!(self.state, RetestState::AwaitingConfirmation { .. })
    }

    /// The confirmation surface stays open through the post-confirm delay.
    pub fn confirmation_visible(&self) -> bool {
        matches!(
            self.state,
            RetestState::AwaitingConfirmation { .. } | RetestState::Confirmed
        )
    }

    fn invalid(&self, action: &'static str) -> RetestError {
        RetestError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }

    pub fn request_confirmation(&mut self, thing_to_add: impl Into<String>) -> Result<(), RetestError> {
        match self.state {
            RetestState::Ready => {
                self.state = RetestState::AwaitingConfirmation {
                    thing_to_add: thing_to_add.into(),
                };
                Ok(())
            }
            _ => Err(self.invalid("request confirmation")),
        }
    }

    /// Closes the confirmation without rerunning. A no-op outside
    /// `AwaitingConfirmation`.
    pub fn decline(&mut self) {
        if self.is_awaiting_confirmation() {
            self.state = RetestState::Ready;
        }
    }

    /// Returns what the user confirmed adding.
    pub fn confirm(&mut self) -> Result<String, RetestError> {
        match std::mem::take(&mut self.state) {
            RetestState::AwaitingConfirmation { thing_to_add } => {
                self.state = RetestState::Confirmed;
                Ok(thing_to_add)
            }
            other => {
                self.state = other;
                Err(self.invalid("confirm"))
            }
        }
    }

    /// Allowed from `Ready` (direct retest) or `Confirmed`.
    pub fn begin_reset(&mut self) -> Result<(), RetestError> {
        match self.state {
            RetestState::Ready | RetestState::Confirmed => {
                self.state = RetestState::Resetting;
                Ok(())
            }
            _ => Err(self.invalid("begin reset")),
        }
    }

    pub fn begin_run(&mut self) -> Result<(), RetestError> {
        match self.state {
            RetestState::Resetting => {
                self.state = RetestState::Running;
                Ok(())
            }
            _ => Err(self.invalid("begin run")),
        }
    }

    pub fn finish(&mut self) -> Result<(), RetestError> {
        match self.state {
            RetestState::Running => {
                self.state = RetestState::Ready;
                Ok(())
            }
            _ => Err(self.invalid("finish")),
        }
    }

    /// Returns to `Ready` from any state after a failed rerun.
    pub fn abort(&mut self) {
        self.state = RetestState::Ready;
    }
}
