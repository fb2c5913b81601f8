#![forbid(unsafe_code)]

//! Bridge between the host UI's live session data and the oracle core.
//!
//! The host hands over an opaque key/value snapshot of its session
//! ([`SessionStateMap`]); extraction turns it into one `AppState`
//! satisfying the structural invariants. Extraction is a synchronous,
//! non-blocking read. A host that populates the map inconsistently is not
//! rejected here: the broken snapshot flows into the core, whose invariant
//! checker doubles as the correctness gate on this adapter.
//!
//! Note on timing: the host can navigate or re-select between recording
//! and checking, so the phrase shown on screen may lag the phrase used for
//! comparison. The `displayed_text` field exists to catch exactly that.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use duet_contracts::common::{StepIndex, WallClockNs};
use duet_contracts::state::{AppState, UserState};
use duet_contracts::vocab::{AppCapability, PracticeMode, UiElement, UserIntent};
use duet_oracle::ports::ConsistencyOutcome;
use duet_oracle::session::{OracleError, TestOracle};

/// Contract keys the host is expected to populate in its session map.
pub mod keys {
    pub const PHRASE_LIST: &str = "phrase_list";
    pub const CURRENT_PHRASE_INDEX: &str = "current_phrase_index";
    pub const EDIT_MODE: &str = "edit_mode";
    pub const PRACTICE_TEXT_FREE: &str = "practice_text_free";
    pub const EDIT_PHRASE_INPUT: &str = "edit_phrase_input";
    pub const LAST_RESULT: &str = "last_result";
    pub const LAST_RESULT_SIMILARITY: &str = "similarity";
    pub const LAST_RESULT_RECOGNIZED: &str = "recognized";
    pub const SETTINGS: &str = "settings";
}

/// Anything that can produce a structured app snapshot on demand.
pub trait AppStateSource {
    fn capture(&self) -> AppState;
}

/// Opaque key/value dump of the host UI's live session.
#[derive(Debug, Clone, Default)]
pub struct SessionStateMap {
    values: BTreeMap<String, Value>,
}

impl SessionStateMap {
    pub fn new() -> Self {
        SessionStateMap::default()
    }

    pub fn from_map(values: BTreeMap<String, Value>) -> Self {
        SessionStateMap { values }
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn string_value(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn bool_value(&self, key: &str) -> bool {
        self.values
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn index_value(&self, key: &str) -> usize {
        self.values
            .get(key)
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize
    }

    fn string_list(&self, key: &str) -> Vec<String> {
        match self.values.get(key).and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        }
    }

    fn object(&self, key: &str) -> Option<&serde_json::Map<String, Value>> {
        self.values.get(key).and_then(Value::as_object)
    }
}

impl AppStateSource for SessionStateMap {
    fn capture(&self) -> AppState {
        extract_app_state(self)
    }
}

/// Converts one host session dump into a structured app snapshot.
pub fn extract_app_state(map: &SessionStateMap) -> AppState {
    let phrase_list = map.string_list(keys::PHRASE_LIST);
    let current_phrase_index = map.index_value(keys::CURRENT_PHRASE_INDEX);

    let mode = if phrase_list.is_empty() {
        PracticeMode::FreeText
    } else if map.bool_value(keys::EDIT_MODE) {
        PracticeMode::GuidedEdit
    } else {
        PracticeMode::GuidedList
    };

    let mut state = AppState::new(mode);
    state.phrase_list = phrase_list;
    state.current_phrase_index = current_phrase_index;

    state.current_text = match mode {
        PracticeMode::FreeText => map.string_value(keys::PRACTICE_TEXT_FREE),
        PracticeMode::GuidedEdit => map.string_value(keys::EDIT_PHRASE_INPUT),
        PracticeMode::GuidedList => state.phrase_list.get(current_phrase_index).cloned(),
    };

    // A stored result stands in for both the recording and its analysis.
    let last_result = map.object(keys::LAST_RESULT);
    state.has_recording = last_result.is_some();
    state.has_results = last_result.is_some();
    if let Some(result) = last_result {
        state.current_score = result
            .get(keys::LAST_RESULT_SIMILARITY)
            .and_then(Value::as_f64);
        state.recognized_text = result
            .get(keys::LAST_RESULT_RECOGNIZED)
            .and_then(Value::as_str)
            .map(str::to_string);
    }

    // What is shown is what was extracted.
    state.displayed_text = state.current_text.clone();

    if let Some(settings) = map.object(keys::SETTINGS) {
        for (key, value) in settings {
            let rendered = match value.as_str() {
                Some(text) => text.to_string(),
                None => value.to_string(),
            };
            state.settings.insert(key.clone(), rendered);
        }
    }

    state.visible_elements = infer_visible_elements(&state);
    state.active_capabilities = infer_capabilities(&state);
    state
}

/// Expected on-screen elements for a given app snapshot. This encodes the
/// interface model the tester validates against.
pub fn infer_visible_elements(state: &AppState) -> BTreeSet<UiElement> {
    let mut visible = BTreeSet::new();

    visible.insert(UiElement::PhraseListUploader);

    match state.mode {
        PracticeMode::FreeText => {
            visible.insert(UiElement::TextInputFree);
        }
        PracticeMode::GuidedList => {
            visible.insert(UiElement::PhraseDisplayBold);
            visible.insert(UiElement::PrevButton);
            visible.insert(UiElement::NextButton);
            visible.insert(UiElement::JumpSelector);
            visible.insert(UiElement::ProgressBar);
            visible.insert(UiElement::EditButton);
            visible.insert(UiElement::ClearListButton);
            // Manual input and the recorder stay available in guided mode.
            visible.insert(UiElement::TextInputFree);
            visible.insert(UiElement::AudioRecorder);
        }
        PracticeMode::GuidedEdit => {
            visible.insert(UiElement::TextInputEdit);
            visible.insert(UiElement::BackToListButton);
            visible.insert(UiElement::PrevButton);
            visible.insert(UiElement::NextButton);
            visible.insert(UiElement::JumpSelector);
            visible.insert(UiElement::ProgressBar);
        }
    }

    if state.current_text.is_some() {
        visible.insert(UiElement::AudioPlayerTargetPractice);
        visible.insert(UiElement::AudioRecorder);
    }

    if state.has_recording {
        visible.insert(UiElement::AudioPlayerUserLive);
        visible.insert(UiElement::CheckButton);
        visible.insert(UiElement::ClearButton);
    }

    if state.has_results {
        visible.insert(UiElement::ResultsPanel);
        visible.insert(UiElement::AudioPlayerTargetResults);
        visible.insert(UiElement::AudioPlayerUserResults);
        visible.insert(UiElement::AudioPlayerRecognizedTts);
    }

    visible
}

/// Expected active ports for a given app snapshot.
pub fn infer_capabilities(state: &AppState) -> BTreeSet<AppCapability> {
    let mut capabilities = BTreeSet::new();

    capabilities.insert(AppCapability::AcceptFileUpload);

    match state.mode {
        PracticeMode::FreeText => {
            capabilities.insert(AppCapability::AcceptTextInput);
        }
        PracticeMode::GuidedList => {
            capabilities.insert(AppCapability::AcceptNavigationPrev);
            capabilities.insert(AppCapability::AcceptNavigationNext);
            if state.phrase_list.len() > 1 {
                capabilities.insert(AppCapability::AcceptJumpToPhrase);
            }
            capabilities.insert(AppCapability::AcceptModeToggle);
            capabilities.insert(AppCapability::AcceptClearList);
            capabilities.insert(AppCapability::AcceptTextInput);
            capabilities.insert(AppCapability::AcceptAudioRecording);
        }
        PracticeMode::GuidedEdit => {
            capabilities.insert(AppCapability::AcceptTextInput);
            capabilities.insert(AppCapability::AcceptModeToggle);
        }
    }

    if state.current_text.is_some() {
        capabilities.insert(AppCapability::ProvideTargetAudioPractice);
        capabilities.insert(AppCapability::AcceptAudioRecording);
    }

    if state.has_recording {
        capabilities.insert(AppCapability::ProvideUserAudioLive);
        capabilities.insert(AppCapability::AcceptClearRecording);
    }

    if state.has_results {
        capabilities.insert(AppCapability::ProvideAnalysisResults);
        capabilities.insert(AppCapability::ProvideTargetAudioResults);
        capabilities.insert(AppCapability::ProvideUserAudioResults);
        capabilities.insert(AppCapability::ProvideRecognizedAudio);
        capabilities.insert(AppCapability::ProvidePhonemeAudioCorrect);
        capabilities.insert(AppCapability::ProvidePhonemeAudioUser);
    }

    capabilities
}

pub trait WallClock {
    fn now(&self) -> WallClockNs;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now(&self) -> WallClockNs {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => WallClockNs(elapsed.as_nanos() as u64),
            Err(_) => WallClockNs(0),
        }
    }
}

/// Wires a state source, a clock and an oracle into one testing session.
/// Capture is gated by `enabled` so the instrumentation can ship disabled
/// and be switched on per run.
#[derive(Debug)]
pub struct SessionDriver<S, C>
where
    S: AppStateSource,
    C: WallClock,
{
    oracle: TestOracle,
    source: S,
    clock: C,
    enabled: bool,
}

impl<S, C> SessionDriver<S, C>
where
    S: AppStateSource,
    C: WallClock,
{
    pub fn new(source: S, clock: C, enabled: bool) -> Self {
        SessionDriver {
            oracle: TestOracle::new(),
            source,
            clock,
            enabled,
        }
    }

    pub fn with_oracle(oracle: TestOracle, source: S, clock: C, enabled: bool) -> Self {
        SessionDriver {
            oracle,
            source,
            clock,
            enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Captures the current host state and records one transition.
    /// Returns `None` without touching the history when capture is
    /// disabled.
    pub fn capture_transition(
        &mut self,
        intents: BTreeSet<UserIntent>,
        expected_visible: BTreeSet<UiElement>,
    ) -> Option<StepIndex> {
        if !self.enabled {
            return None;
        }
        let app = self.source.capture();
        let mut user = UserState::new();
        user.active_intents = intents;
        user.expected_visible = expected_visible;
        Some(self.oracle.transition(app, user, self.clock.now()))
    }

    pub fn validate(
        &mut self,
        matches: bool,
        note: Option<String>,
    ) -> Result<ConsistencyOutcome, OracleError> {
        self.oracle.user_validation(matches, note)
    }

    pub fn oracle(&self) -> &TestOracle {
        &self.oracle
    }

    pub fn into_oracle(self) -> TestOracle {
        self.oracle
    }
}

/// Canonical app snapshots used by tests and demos.
pub mod fixtures {
    use super::*;

    pub fn free_text_app_state() -> AppState {
        let mut state = AppState::new(PracticeMode::FreeText);
        state.visible_elements =
            [UiElement::TextInputFree, UiElement::PhraseListUploader]
                .into_iter()
                .collect();
        state.active_capabilities =
            [AppCapability::AcceptTextInput, AppCapability::AcceptFileUpload]
                .into_iter()
                .collect();
        state
    }

    pub fn guided_list_app_state(phrase_list: Vec<String>, index: usize) -> AppState {
        let mut state = AppState::new(PracticeMode::GuidedList);
        state.current_text = phrase_list.get(index).cloned();
        state.phrase_list = phrase_list;
        state.current_phrase_index = index;
        state.visible_elements = [
            UiElement::PhraseDisplayBold,
            UiElement::PrevButton,
            UiElement::NextButton,
            UiElement::JumpSelector,
            UiElement::EditButton,
            UiElement::ProgressBar,
            UiElement::PhraseListUploader,
        ]
        .into_iter()
        .collect();
        state.active_capabilities = [
            AppCapability::AcceptNavigationPrev,
            AppCapability::AcceptNavigationNext,
            AppCapability::AcceptJumpToPhrase,
            AppCapability::AcceptModeToggle,
            AppCapability::AcceptFileUpload,
        ]
        .into_iter()
        .collect();
        state
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct FixedClock(WallClockNs);

    impl WallClock for FixedClock {
        fn now(&self) -> WallClockNs {
            self.0
        }
    }

    fn guided_map(phrases: &[&str], index: u64) -> SessionStateMap {
        let mut map = SessionStateMap::new();
        map.set(keys::PHRASE_LIST, json!(phrases));
        map.set(keys::CURRENT_PHRASE_INDEX, json!(index));
        map
    }

    #[test]
    fn at_adapter_01_mode_is_inferred_from_the_session_keys() {
        assert_eq!(
            extract_app_state(&SessionStateMap::new()).mode,
            PracticeMode::FreeText
        );

        let guided = guided_map(&["Bom dia"], 0);
        assert_eq!(extract_app_state(&guided).mode, PracticeMode::GuidedList);

        let mut editing = guided_map(&["Bom dia"], 0);
        editing.set(keys::EDIT_MODE, json!(true));
        assert_eq!(extract_app_state(&editing).mode, PracticeMode::GuidedEdit);
    }

    #[test]
    fn at_adapter_02_guided_extraction_meets_the_invariants() {
        let map = guided_map(&["Bom dia", "Obrigado", "Por favor"], 1);
        let state = extract_app_state(&map);

        assert_eq!(state.current_text.as_deref(), Some("Obrigado"));
        assert_eq!(state.displayed_text.as_deref(), Some("Obrigado"));
        assert!(state.check_invariants().is_empty());
    }

    #[test]
    fn at_adapter_03_broken_host_state_is_caught_by_the_core_gate() {
        // Host reports an index past the end of its own list.
        let map = guided_map(&["Bom dia"], 5);
        let state = extract_app_state(&map);

        assert!(state.current_text.is_none());
        let violations = state.check_invariants();
        assert!(violations.iter().any(|v| v.contains("out of bounds")));
    }

    #[test]
    fn at_adapter_04_results_are_read_from_the_last_result_entry() {
        let mut map = guided_map(&["Bom dia"], 0);
        map.set(
            keys::LAST_RESULT,
            json!({"similarity": 0.87, "recognized": "bom dia"}),
        );
        let state = extract_app_state(&map);

        assert!(state.has_recording);
        assert!(state.has_results);
        assert_eq!(state.current_score, Some(0.87));
        assert_eq!(state.recognized_text.as_deref(), Some("bom dia"));
        assert!(state.visible_elements.contains(&UiElement::ResultsPanel));
        assert!(state
            .active_capabilities
            .contains(&AppCapability::ProvideAnalysisResults));
        assert!(state.check_invariants().is_empty());
    }

    #[test]
    fn at_adapter_05_settings_are_carried_for_reproducibility() {
        let mut map = SessionStateMap::new();
        map.set(keys::SETTINGS, json!({"voice": "pt-PT", "speed": 1.25}));
        let state = extract_app_state(&map);

        assert_eq!(state.settings.get("voice").map(String::as_str), Some("pt-PT"));
        assert_eq!(state.settings.get("speed").map(String::as_str), Some("1.25"));
    }

    #[test]
    fn at_adapter_06_jump_selector_needs_more_than_one_phrase() {
        let single = extract_app_state(&guided_map(&["Bom dia"], 0));
        assert!(!single
            .active_capabilities
            .contains(&AppCapability::AcceptJumpToPhrase));

        let several = extract_app_state(&guided_map(&["Bom dia", "Obrigado"], 0));
        assert!(several
            .active_capabilities
            .contains(&AppCapability::AcceptJumpToPhrase));
    }

    #[test]
    fn at_adapter_07_disabled_driver_records_nothing() {
        let mut driver =
            SessionDriver::new(SessionStateMap::new(), FixedClock(WallClockNs(1)), false);
        assert_eq!(
            driver.capture_transition(BTreeSet::new(), BTreeSet::new()),
            None
        );
        assert_eq!(driver.oracle().step_count(), 0);
    }

    #[test]
    fn at_adapter_08_driver_capture_and_mismatch_verdict() {
        let map = guided_map(&["Bom dia"], 0);
        let mut driver = SessionDriver::new(map, FixedClock(WallClockNs(42)), true);

        let step = driver
            .capture_transition(
                [UserIntent::WantGoNext].into_iter().collect(),
                [UiElement::PhraseDisplayBold].into_iter().collect(),
            )
            .unwrap();
        assert_eq!(step, StepIndex(0));

        let outcome = driver
            .validate(false, Some("phrase not bold".to_string()))
            .unwrap();
        assert_eq!(outcome, ConsistencyOutcome::MismatchRecorded);
        assert_eq!(driver.oracle().get_bugs().len(), 1);
    }

    #[test]
    fn at_adapter_09_fixture_states_are_structurally_valid() {
        assert!(fixtures::free_text_app_state().check_invariants().is_empty());
        let guided = fixtures::guided_list_app_state(
            vec!["Bom dia".to_string(), "Obrigado".to_string()],
            1,
        );
        assert!(guided.check_invariants().is_empty());
        assert_eq!(guided.current_text.as_deref(), Some("Obrigado"));
    }
}
