#![forbid(unsafe_code)]

//! Per-agent state snapshots: what the app offers and what the tester
//! wants. Both are plain data. A structurally broken `AppState` is never
//! an error at construction time; it is reported through
//! [`AppState::check_invariants`] so a session keeps running and keeps
//! its evidence.

use std::collections::{BTreeMap, BTreeSet};

use crate::vocab::{AppCapability, PracticeMode, UiElement, UserIntent};

/// Snapshot of the app agent: mode, data state, and the ports it offers.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub mode: PracticeMode,
    /// Phrase currently being practiced, when one is loaded or typed.
    pub current_text: Option<String>,
    pub phrase_list: Vec<String>,
    pub current_phrase_index: usize,
    pub has_recording: bool,
    pub has_results: bool,
    /// Phrase actually shown on screen, as observed by the extraction
    /// adapter. `None` means not yet observed, which is never a violation.
    pub displayed_text: Option<String>,
    pub current_score: Option<f64>,
    pub recognized_text: Option<String>,
    pub settings: BTreeMap<String, String>,
    pub visible_elements: BTreeSet<UiElement>,
    pub active_capabilities: BTreeSet<AppCapability>,
}

impl AppState {
    pub fn new(mode: PracticeMode) -> Self {
        AppState {
            mode,
            current_text: None,
            phrase_list: Vec::new(),
            current_phrase_index: 0,
            has_recording: false,
            has_results: false,
            displayed_text: None,
            current_score: None,
            recognized_text: None,
            settings: BTreeMap::new(),
            visible_elements: BTreeSet::new(),
            active_capabilities: BTreeSet::new(),
        }
    }

    /// Checks every structural invariant and returns all violations found.
    ///
    /// The pass never exits early: a single broken snapshot can report
    /// several defects at once. Pure and side-effect-free; an empty list
    /// means the snapshot is structurally valid.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if self.has_results && !self.has_recording {
            violations.push("results exist but no recording is present".to_string());
        }

        if self.mode == PracticeMode::GuidedList && self.phrase_list.is_empty() {
            violations.push("GUIDED_LIST mode with an empty phrase list".to_string());
        }

        if !self.phrase_list.is_empty() && self.current_phrase_index >= self.phrase_list.len() {
            violations.push(format!(
                "phrase index {} out of bounds (len={})",
                self.current_phrase_index,
                self.phrase_list.len()
            ));
        }

        if self.has_results {
            match self.current_score {
                None => violations.push("results exist but no score is available".to_string()),
                Some(score) if !score.is_finite() => {
                    violations.push(format!("score {score} is not finite"));
                }
                Some(_) => {}
            }
        }

        if self.mode == PracticeMode::GuidedList
            && self.current_phrase_index < self.phrase_list.len()
        {
            let expected = &self.phrase_list[self.current_phrase_index];
            if let Some(displayed) = &self.displayed_text {
                if displayed != expected {
                    violations.push(format!(
                        "displayed text '{}' does not match list phrase '{}' at index {}",
                        displayed, expected, self.current_phrase_index
                    ));
                }
            }
        }

        violations
    }
}

/// Tester perception of the current step: did the live interface match
/// the predicted one? `Unknown` is a first-class pending state and is
/// never treated as a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Perception {
    Unknown,
    Match,
    Mismatch,
}

impl Perception {
    pub fn as_str(self) -> &'static str {
        match self {
            Perception::Unknown => "UNKNOWN",
            Perception::Match => "MATCH",
            Perception::Mismatch => "MISMATCH",
        }
    }
}

/// Snapshot of the tester agent: the ports it raises and the interface it
/// expects to see. No computation lives here; the verdict is written once
/// per step through the session's validation entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct UserState {
    pub active_intents: BTreeSet<UserIntent>,
    pub expected_visible: BTreeSet<UiElement>,
    pub perception: Perception,
    pub perception_note: Option<String>,
}

impl UserState {
    pub fn new() -> Self {
        UserState {
            active_intents: BTreeSet::new(),
            expected_visible: BTreeSet::new(),
            perception: Perception::Unknown,
            perception_note: None,
        }
    }

    pub fn with_intents<I: IntoIterator<Item = UserIntent>>(intents: I) -> Self {
        let mut state = UserState::new();
        state.active_intents = intents.into_iter().collect();
        state
    }
}

impl Default for UserState {
    fn default() -> Self {
        UserState::new()
    }
}
