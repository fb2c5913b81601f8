#![forbid(unsafe_code)]

//! Closed interaction vocabulary shared by every producer and consumer of
//! session state.
//!
//! The four enumerations below are a fixed contract: the app agent offers
//! `AppCapability` ports, the tester agent raises `UserIntent` ports, and
//! both sides describe the interface in terms of `UiElement`s. Registering
//! a new UI affordance means adding it here as a `UiElement` and, when it
//! has a host-side effect, as an `AppCapability` as well. None of these
//! sets is extensible at runtime.

/// High-level practice modes of the app under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PracticeMode {
    /// Tester types any phrase.
    FreeText,
    /// Tester navigates through a loaded phrase list.
    GuidedList,
    /// Tester edits the current phrase from the list.
    GuidedEdit,
}

impl PracticeMode {
    pub const ALL: [PracticeMode; 3] = [
        PracticeMode::FreeText,
        PracticeMode::GuidedList,
        PracticeMode::GuidedEdit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PracticeMode::FreeText => "FREE_TEXT",
            PracticeMode::GuidedList => "GUIDED_LIST",
            PracticeMode::GuidedEdit => "GUIDED_EDIT",
        }
    }
}

/// Visible interface elements that can be present or absent on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UiElement {
    // Input elements
    TextInputFree,
    TextInputEdit,
    AudioRecorder,

    // Display elements
    PhraseDisplayBold,
    ResultsPanel,

    // Audio players, one per playback purpose
    AudioPlayerTargetPractice,
    AudioPlayerUserLive,
    AudioPlayerTargetResults,
    AudioPlayerUserResults,
    AudioPlayerRecognizedTts,
    AudioPlayerPhonemeCorrect,
    AudioPlayerPhonemeUser,

    // Navigation elements
    PhraseListUploader,
    PrevButton,
    NextButton,
    JumpSelector,
    ProgressBar,

    // Control buttons
    CheckButton,
    ClearButton,
    EditButton,
    BackToListButton,
    ClearListButton,
}

impl UiElement {
    pub const ALL: [UiElement; 22] = [
        UiElement::TextInputFree,
        UiElement::TextInputEdit,
        UiElement::AudioRecorder,
        UiElement::PhraseDisplayBold,
        UiElement::ResultsPanel,
        UiElement::AudioPlayerTargetPractice,
        UiElement::AudioPlayerUserLive,
        UiElement::AudioPlayerTargetResults,
        UiElement::AudioPlayerUserResults,
        UiElement::AudioPlayerRecognizedTts,
        UiElement::AudioPlayerPhonemeCorrect,
        UiElement::AudioPlayerPhonemeUser,
        UiElement::PhraseListUploader,
        UiElement::PrevButton,
        UiElement::NextButton,
        UiElement::JumpSelector,
        UiElement::ProgressBar,
        UiElement::CheckButton,
        UiElement::ClearButton,
        UiElement::EditButton,
        UiElement::BackToListButton,
        UiElement::ClearListButton,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UiElement::TextInputFree => "TEXT_INPUT_FREE",
            UiElement::TextInputEdit => "TEXT_INPUT_EDIT",
            UiElement::AudioRecorder => "AUDIO_RECORDER",
            UiElement::PhraseDisplayBold => "PHRASE_DISPLAY_BOLD",
            UiElement::ResultsPanel => "RESULTS_PANEL",
            UiElement::AudioPlayerTargetPractice => "AUDIO_PLAYER_TARGET_PRACTICE",
            UiElement::AudioPlayerUserLive => "AUDIO_PLAYER_USER_LIVE",
            UiElement::AudioPlayerTargetResults => "AUDIO_PLAYER_TARGET_RESULTS",
            UiElement::AudioPlayerUserResults => "AUDIO_PLAYER_USER_RESULTS",
            UiElement::AudioPlayerRecognizedTts => "AUDIO_PLAYER_RECOGNIZED_TTS",
            UiElement::AudioPlayerPhonemeCorrect => "AUDIO_PLAYER_PHONEME_CORRECT",
            UiElement::AudioPlayerPhonemeUser => "AUDIO_PLAYER_PHONEME_USER",
            UiElement::PhraseListUploader => "PHRASE_LIST_UPLOADER",
            UiElement::PrevButton => "PREV_BUTTON",
            UiElement::NextButton => "NEXT_BUTTON",
            UiElement::JumpSelector => "JUMP_SELECTOR",
            UiElement::ProgressBar => "PROGRESS_BAR",
            UiElement::CheckButton => "CHECK_BUTTON",
            UiElement::ClearButton => "CLEAR_BUTTON",
            UiElement::EditButton => "EDIT_BUTTON",
            UiElement::BackToListButton => "BACK_TO_LIST_BUTTON",
            UiElement::ClearListButton => "CLEAR_LIST_BUTTON",
        }
    }
}

/// What the app agent can currently accept or provide (its input ports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AppCapability {
    AcceptTextInput,
    AcceptAudioRecording,
    AcceptFileUpload,
    AcceptNavigationPrev,
    AcceptNavigationNext,
    AcceptJumpToPhrase,
    AcceptModeToggle,
    AcceptClearRecording,
    AcceptClearList,

    // Audio provision, one per playback purpose
    ProvideTargetAudioPractice,
    ProvideUserAudioLive,
    ProvideTargetAudioResults,
    ProvideUserAudioResults,
    ProvideRecognizedAudio,
    ProvidePhonemeAudioCorrect,
    ProvidePhonemeAudioUser,
    ProvideAnalysisResults,
}

impl AppCapability {
    pub const ALL: [AppCapability; 17] = [
        AppCapability::AcceptTextInput,
        AppCapability::AcceptAudioRecording,
        AppCapability::AcceptFileUpload,
        AppCapability::AcceptNavigationPrev,
        AppCapability::AcceptNavigationNext,
        AppCapability::AcceptJumpToPhrase,
        AppCapability::AcceptModeToggle,
        AppCapability::AcceptClearRecording,
        AppCapability::AcceptClearList,
        AppCapability::ProvideTargetAudioPractice,
        AppCapability::ProvideUserAudioLive,
        AppCapability::ProvideTargetAudioResults,
        AppCapability::ProvideUserAudioResults,
        AppCapability::ProvideRecognizedAudio,
        AppCapability::ProvidePhonemeAudioCorrect,
        AppCapability::ProvidePhonemeAudioUser,
        AppCapability::ProvideAnalysisResults,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppCapability::AcceptTextInput => "ACCEPT_TEXT_INPUT",
            AppCapability::AcceptAudioRecording => "ACCEPT_AUDIO_RECORDING",
            AppCapability::AcceptFileUpload => "ACCEPT_FILE_UPLOAD",
            AppCapability::AcceptNavigationPrev => "ACCEPT_NAVIGATION_PREV",
            AppCapability::AcceptNavigationNext => "ACCEPT_NAVIGATION_NEXT",
            AppCapability::AcceptJumpToPhrase => "ACCEPT_JUMP_TO_PHRASE",
            AppCapability::AcceptModeToggle => "ACCEPT_MODE_TOGGLE",
            AppCapability::AcceptClearRecording => "ACCEPT_CLEAR_RECORDING",
            AppCapability::AcceptClearList => "ACCEPT_CLEAR_LIST",
            AppCapability::ProvideTargetAudioPractice => "PROVIDE_TARGET_AUDIO_PRACTICE",
            AppCapability::ProvideUserAudioLive => "PROVIDE_USER_AUDIO_LIVE",
            AppCapability::ProvideTargetAudioResults => "PROVIDE_TARGET_AUDIO_RESULTS",
            AppCapability::ProvideUserAudioResults => "PROVIDE_USER_AUDIO_RESULTS",
            AppCapability::ProvideRecognizedAudio => "PROVIDE_RECOGNIZED_AUDIO",
            AppCapability::ProvidePhonemeAudioCorrect => "PROVIDE_PHONEME_AUDIO_CORRECT",
            AppCapability::ProvidePhonemeAudioUser => "PROVIDE_PHONEME_AUDIO_USER",
            AppCapability::ProvideAnalysisResults => "PROVIDE_ANALYSIS_RESULTS",
        }
    }
}

/// What the tester agent currently wants to do (its output ports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UserIntent {
    WantEnterText,
    WantRecordAudio,
    WantUploadFile,
    WantGoPrevious,
    WantGoNext,
    WantJumpToPhrase,
    WantToggleMode,
    WantClearRecording,
    WantClearList,
    WantSeeResults,

    // Audio playback intents, one per playback purpose
    WantHearTargetPractice,
    WantHearUserLive,
    WantHearTargetResults,
    WantHearUserResults,
    WantHearRecognized,
    WantHearPhonemeCorrect,
    WantHearPhonemeUser,
}

impl UserIntent {
    pub const ALL: [UserIntent; 17] = [
        UserIntent::WantEnterText,
        UserIntent::WantRecordAudio,
        UserIntent::WantUploadFile,
        UserIntent::WantGoPrevious,
        UserIntent::WantGoNext,
        UserIntent::WantJumpToPhrase,
        UserIntent::WantToggleMode,
        UserIntent::WantClearRecording,
        UserIntent::WantClearList,
        UserIntent::WantSeeResults,
        UserIntent::WantHearTargetPractice,
        UserIntent::WantHearUserLive,
        UserIntent::WantHearTargetResults,
        UserIntent::WantHearUserResults,
        UserIntent::WantHearRecognized,
        UserIntent::WantHearPhonemeCorrect,
        UserIntent::WantHearPhonemeUser,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UserIntent::WantEnterText => "WANT_ENTER_TEXT",
            UserIntent::WantRecordAudio => "WANT_RECORD_AUDIO",
            UserIntent::WantUploadFile => "WANT_UPLOAD_FILE",
            UserIntent::WantGoPrevious => "WANT_GO_PREVIOUS",
            UserIntent::WantGoNext => "WANT_GO_NEXT",
            UserIntent::WantJumpToPhrase => "WANT_JUMP_TO_PHRASE",
            UserIntent::WantToggleMode => "WANT_TOGGLE_MODE",
            UserIntent::WantClearRecording => "WANT_CLEAR_RECORDING",
            UserIntent::WantClearList => "WANT_CLEAR_LIST",
            UserIntent::WantSeeResults => "WANT_SEE_RESULTS",
            UserIntent::WantHearTargetPractice => "WANT_HEAR_TARGET_PRACTICE",
            UserIntent::WantHearUserLive => "WANT_HEAR_USER_LIVE",
            UserIntent::WantHearTargetResults => "WANT_HEAR_TARGET_RESULTS",
            UserIntent::WantHearUserResults => "WANT_HEAR_USER_RESULTS",
            UserIntent::WantHearRecognized => "WANT_HEAR_RECOGNIZED",
            UserIntent::WantHearPhonemeCorrect => "WANT_HEAR_PHONEME_CORRECT",
            UserIntent::WantHearPhonemeUser => "WANT_HEAR_PHONEME_USER",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn at_vocab_01_all_tables_are_complete_and_distinct() {
        assert_eq!(
            PracticeMode::ALL.iter().collect::<BTreeSet<_>>().len(),
            PracticeMode::ALL.len()
        );
        assert_eq!(
            UiElement::ALL.iter().collect::<BTreeSet<_>>().len(),
            UiElement::ALL.len()
        );
        assert_eq!(
            AppCapability::ALL.iter().collect::<BTreeSet<_>>().len(),
            AppCapability::ALL.len()
        );
        assert_eq!(
            UserIntent::ALL.iter().collect::<BTreeSet<_>>().len(),
            UserIntent::ALL.len()
        );
    }

    #[test]
    fn at_vocab_02_wire_names_are_unique_per_enum() {
        let ui: BTreeSet<&'static str> = UiElement::ALL.iter().map(|e| e.as_str()).collect();
        assert_eq!(ui.len(), UiElement::ALL.len());

        let caps: BTreeSet<&'static str> =
            AppCapability::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(caps.len(), AppCapability::ALL.len());

        let intents: BTreeSet<&'static str> =
            UserIntent::ALL.iter().map(|i| i.as_str()).collect();
        assert_eq!(intents.len(), UserIntent::ALL.len());
    }
}
