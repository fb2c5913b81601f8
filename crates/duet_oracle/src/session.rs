#![forbid(unsafe_code)]

//! Session runtime: one tester, one forward-only history.
//!
//! The session owns an append-only, strictly step-ordered sequence of
//! interaction snapshots. Entries are never revisited, reordered or
//! pruned; after an entry is appended, the only permitted mutation is the
//! deferred perception verdict on the most recent entry. A run has no
//! terminal state: the host stops calling [`TestOracle::transition`] and
//! serializes whenever it is done.

use std::collections::BTreeMap;
use std::path::Path;

use duet_contracts::common::{ElapsedNs, StepIndex, WallClockNs};
use duet_contracts::interaction::{BugRecord, InteractionSnapshot};
use duet_contracts::state::{AppState, Perception, UserState};
use duet_contracts::vocab::PracticeMode;

use crate::document::{document_from_history, PersistError, SessionDocument};
use crate::ports::{check_ui_consistency, compute_port_matching, ConsistencyOutcome};

const AUTOMATED_CHECK_NOTE: &str = "automated invariant check";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleError {
    /// Validation was requested before any snapshot was recorded.
    EmptyHistory,
    /// The most recent entry already carries a verdict; one per step.
    VerdictAlreadyRecorded { step: StepIndex },
}

/// Test oracle for a single run. One instance per tester; concurrent
/// sessions each get their own instance and never share history.
#[derive(Debug, Clone, Default)]
pub struct TestOracle {
    run_config: BTreeMap<String, String>,
    history: Vec<InteractionSnapshot>,
}

impl TestOracle {
    pub fn new() -> Self {
        TestOracle::default()
    }

    /// Free-form run configuration, embedded verbatim in the persisted
    /// session document.
    pub fn with_run_config(run_config: BTreeMap<String, String>) -> Self {
        TestOracle {
            run_config,
            history: Vec::new(),
        }
    }

    /// Records the baseline entry for a fresh run: the given mode, an
    /// empty tester state, no matching and no checks. Observation starts
    /// with the first transition.
    pub fn initialize(&mut self, mode: PracticeMode, now: WallClockNs) -> StepIndex {
        let step = StepIndex(self.history.len() as u64);
        let snapshot = InteractionSnapshot::new(
            step,
            now,
            ElapsedNs(0),
            AppState::new(mode),
            UserState::new(),
        );
        self.history.push(snapshot);
        step
    }

    /// Records one observed transition.
    ///
    /// Builds a fresh snapshot tagged with the next step number, runs the
    /// port-matching pass, and runs the structural invariant check on the
    /// new app state. Violations never abort the run; they are recorded as
    /// one automatic bug on the snapshot so the evidence survives.
    /// Elapsed time is measured against the previous entry's timestamp and
    /// clamps to zero when there is none or the clock went backwards.
    pub fn transition(
        &mut self,
        new_app_state: AppState,
        new_user_state: UserState,
        now: WallClockNs,
    ) -> StepIndex {
        let elapsed = match self.history.last() {
            Some(prev) => ElapsedNs(now.0.saturating_sub(prev.timestamp.0)),
            None => ElapsedNs(0),
        };
        let step = StepIndex(self.history.len() as u64);

        let mut snapshot =
            InteractionSnapshot::new(step, now, elapsed, new_app_state, new_user_state);

        let matching = compute_port_matching(&snapshot.app, &snapshot.user);
        snapshot.satisfied = matching.satisfied;
        snapshot.unsatisfied_intents = matching.unsatisfied_intents;
        snapshot.unused_capabilities = matching.unused_capabilities;

        let violations = snapshot.app.check_invariants();
        if !violations.is_empty() {
            snapshot.bugs.push(BugRecord::InvariantViolation {
                step,
                violations,
                note: AUTOMATED_CHECK_NOTE.to_string(),
            });
        }

        self.history.push(snapshot);
        step
    }

    /// The tester's verdict for the current step. This is the only path
    /// that mutates an already-appended entry: it writes the perception
    /// fields on the most recent snapshot and re-runs the consistency
    /// oracle on it. Each step accepts exactly one verdict.
    pub fn user_validation(
        &mut self,
        matches: bool,
        note: Option<String>,
    ) -> Result<ConsistencyOutcome, OracleError> {
        let snapshot = self.history.last_mut().ok_or(OracleError::EmptyHistory)?;
        if snapshot.user.perception != Perception::Unknown {
            return Err(OracleError::VerdictAlreadyRecorded {
                step: snapshot.step,
            });
        }
        snapshot.user.perception = if matches {
            Perception::Match
        } else {
            Perception::Mismatch
        };
        snapshot.user.perception_note = note;
        Ok(check_ui_consistency(snapshot))
    }

    /// All bugs across the whole history, concatenated in step order.
    pub fn get_bugs(&self) -> Vec<BugRecord> {
        self.history
            .iter()
            .flat_map(|snapshot| snapshot.bugs.iter().cloned())
            .collect()
    }

    pub fn history(&self) -> &[InteractionSnapshot] {
        &self.history
    }

    pub fn current(&self) -> Option<&InteractionSnapshot> {
        self.history.last()
    }

    pub fn step_count(&self) -> u64 {
        self.history.len() as u64
    }

    pub fn run_config(&self) -> &BTreeMap<String, String> {
        &self.run_config
    }

    pub fn to_document(&self) -> Result<SessionDocument, PersistError> {
        document_from_history(&self.run_config, &self.history)
    }

    /// Writes the session document as pretty-printed JSON. A failed write
    /// surfaces as [`PersistError`] and leaves the in-memory history
    /// untouched and retryable.
    pub fn save_to(&self, path: &Path) -> Result<(), PersistError> {
        let document = self.to_document()?;
        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
