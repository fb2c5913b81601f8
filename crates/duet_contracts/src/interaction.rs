#![forbid(unsafe_code)]

//! Combined snapshot of one observed transition: both agents, the derived
//! port-matching sets, and the defects recorded at that step.

use std::collections::BTreeSet;

use crate::common::{ElapsedNs, StepIndex, WallClockNs};
use crate::state::{AppState, UserState};
use crate::vocab::{AppCapability, UiElement, UserIntent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BugKind {
    InvariantViolation,
    UiInconsistency,
}

impl BugKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BugKind::InvariantViolation => "INVARIANT_VIOLATION",
            BugKind::UiInconsistency => "UI_INCONSISTENCY",
        }
    }
}

/// One recorded defect. Append-only: a record is never edited, deleted or
/// reordered once it is on a snapshot's bug list.
#[derive(Debug, Clone, PartialEq)]
pub enum BugRecord {
    /// Raised automatically when a new app snapshot fails its structural
    /// invariant check.
    InvariantViolation {
        step: StepIndex,
        violations: Vec<String>,
        note: String,
    },
    /// Raised when the tester reports that the live interface did not
    /// match the predicted one.
    UiInconsistency {
        step: StepIndex,
        expected_visible: BTreeSet<UiElement>,
        actual_visible: BTreeSet<UiElement>,
        note: String,
    },
}

impl BugRecord {
    pub fn kind(&self) -> BugKind {
        match self {
            BugRecord::InvariantViolation { .. } => BugKind::InvariantViolation,
            BugRecord::UiInconsistency { .. } => BugKind::UiInconsistency,
        }
    }

    pub fn step(&self) -> StepIndex {
        match self {
            BugRecord::InvariantViolation { step, .. } => *step,
            BugRecord::UiInconsistency { step, .. } => *step,
        }
    }
}

/// One entry of a session history.
///
/// Exclusively owns its `AppState` and `UserState`; a fresh pair is built
/// for every transition and never shared between entries. After the entry
/// is appended the only permitted mutation is attaching the deferred
/// perception verdict (and the bug it may produce) through the session's
/// validation path, and only while the entry is the most recent one.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionSnapshot {
    pub step: StepIndex,
    pub timestamp: WallClockNs,
    pub elapsed_since_prev: ElapsedNs,
    pub app: AppState,
    pub user: UserState,
    pub satisfied: BTreeSet<(UserIntent, AppCapability)>,
    pub unsatisfied_intents: BTreeSet<UserIntent>,
    pub unused_capabilities: BTreeSet<AppCapability>,
    pub bugs: Vec<BugRecord>,
}

impl InteractionSnapshot {
    /// Builds an entry with empty matching sets and no bugs; the session
    /// fills both before append.
    pub fn new(
        step: StepIndex,
        timestamp: WallClockNs,
        elapsed_since_prev: ElapsedNs,
        app: AppState,
        user: UserState,
    ) -> Self {
        InteractionSnapshot {
            step,
            timestamp,
            elapsed_since_prev,
            app,
            user,
            satisfied: BTreeSet::new(),
            unsatisfied_intents: BTreeSet::new(),
            unused_capabilities: BTreeSet::new(),
            bugs: Vec::new(),
        }
    }
}
