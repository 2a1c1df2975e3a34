//! Submission state machine shared by the controllers.
//!
//! ```text
//!            begin()            submit(optimistic)          settle(value)
//!   Idle ───────────▶ Validating ──────────────────▶ Submitting ─────────────▶ Settled
//!    ▲                    │                                                      │
//!    └──── reject() ──────┘            begin() again from Idle or Settled ◀──────┘
//! ```
//!
//! The machine owns the value a controller displays (a query result or an
//! upload status). `submit` may install an optimistic placeholder, and
//! `settle` always replaces whatever is shown. While validating or
//! submitting the controller is busy and `begin` refuses a second entry.

use serde::Serialize;

use crate::error::ValidationError;
use crate::tree::FolderNode;

/// Outcome of the latest ingestion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadStatus {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_structure: Option<FolderNode>,
}

impl UploadStatus {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            folder_structure: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            folder_structure: None,
        }
    }

    pub fn with_tree(mut self, tree: FolderNode) -> Self {
        self.folder_structure = Some(tree);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Validating,
    Submitting,
    Settled,
}

/// What a controller's submit call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was sent: blank input, or the controller was already busy.
    Ignored,
    /// Blocked locally before any request was made.
    Rejected(ValidationError),
    /// The request ran to completion and its result is stored.
    Settled { success: bool },
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Settled { success: true })
    }
}

/// Returned by [`SubmissionState::begin`] while a submission is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Busy;

#[derive(Debug, Clone)]
pub struct SubmissionState<T> {
    phase: Phase,
    value: Option<T>,
}

impl<T> Default for SubmissionState<T> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            value: None,
        }
    }
}

impl<T> SubmissionState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Validating | Phase::Submitting)
    }

    /// The value currently shown: the optimistic placeholder while
    /// submitting, otherwise the last settled or rejected value.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Enter validation. Fails without side effects when busy.
    pub fn begin(&mut self) -> Result<(), Busy> {
        if self.is_busy() {
            return Err(Busy);
        }
        self.phase = Phase::Validating;
        Ok(())
    }

    /// Leave validation without a request. `Some` replaces the shown value,
    /// `None` leaves it untouched.
    pub fn reject(&mut self, value: Option<T>) {
        debug_assert_eq!(self.phase, Phase::Validating);
        if let Some(v) = value {
            self.value = Some(v);
        }
        self.phase = Phase::Idle;
    }

    /// Mark the request as in flight, showing `optimistic` (or nothing)
    /// until it settles.
    pub fn submit(&mut self, optimistic: Option<T>) {
        debug_assert_eq!(self.phase, Phase::Validating);
        self.value = optimistic;
        self.phase = Phase::Submitting;
    }

    /// Record the final value, overwriting any placeholder.
    pub fn settle(&mut self, value: T) {
        debug_assert_eq!(self.phase, Phase::Submitting);
        self.value = Some(value);
        self.phase = Phase::Settled;
    }
}
