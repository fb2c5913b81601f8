#![forbid(unsafe_code)]

//! Complementary-port matching between the two agents.
//!
//! Every tester intent has exactly one partner capability; the pairing is
//! a fixed table expressed as an exhaustive match, so totality is enforced
//! at compile time and cannot drift when the vocabulary grows. The two
//! agents never exchange messages: matching is a pure function over two
//! immutable snapshots.

use std::collections::BTreeSet;

use duet_contracts::interaction::{BugRecord, InteractionSnapshot};
use duet_contracts::state::{AppState, Perception, UserState};
use duet_contracts::vocab::{AppCapability, UserIntent};

/// The fixed intent-to-capability table. Total over `UserIntent`.
pub fn complementary_capability(intent: UserIntent) -> AppCapability {
    match intent {
        // Control interactions
        UserIntent::WantEnterText => AppCapability::AcceptTextInput,
        UserIntent::WantRecordAudio => AppCapability::AcceptAudioRecording,
        UserIntent::WantUploadFile => AppCapability::AcceptFileUpload,
        UserIntent::WantGoPrevious => AppCapability::AcceptNavigationPrev,
        UserIntent::WantGoNext => AppCapability::AcceptNavigationNext,
        UserIntent::WantJumpToPhrase => AppCapability::AcceptJumpToPhrase,
        UserIntent::WantToggleMode => AppCapability::AcceptModeToggle,
        UserIntent::WantClearRecording => AppCapability::AcceptClearRecording,
        UserIntent::WantClearList => AppCapability::AcceptClearList,
        UserIntent::WantSeeResults => AppCapability::ProvideAnalysisResults,

        // Audio playback interactions
        UserIntent::WantHearTargetPractice => AppCapability::ProvideTargetAudioPractice,
        UserIntent::WantHearUserLive => AppCapability::ProvideUserAudioLive,
        UserIntent::WantHearTargetResults => AppCapability::ProvideTargetAudioResults,
        UserIntent::WantHearUserResults => AppCapability::ProvideUserAudioResults,
        UserIntent::WantHearRecognized => AppCapability::ProvideRecognizedAudio,
        UserIntent::WantHearPhonemeCorrect => AppCapability::ProvidePhonemeAudioCorrect,
        UserIntent::WantHearPhonemeUser => AppCapability::ProvidePhonemeAudioUser,
    }
}

/// Result of one matching pass: which port pairs synchronized, which
/// intents found no active partner, and which offered capabilities no
/// intent consumed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortMatching {
    pub satisfied: BTreeSet<(UserIntent, AppCapability)>,
    pub unsatisfied_intents: BTreeSet<UserIntent>,
    pub unused_capabilities: BTreeSet<AppCapability>,
}

/// Single pass over the tester's active intents. O(|intents| +
/// |capabilities|); identical inputs always yield identical sets.
pub fn compute_port_matching(app: &AppState, user: &UserState) -> PortMatching {
    let mut matching = PortMatching::default();

    for &intent in &user.active_intents {
        let partner = complementary_capability(intent);
        if app.active_capabilities.contains(&partner) {
            matching.satisfied.insert((intent, partner));
        } else {
            matching.unsatisfied_intents.insert(intent);
        }
    }

    let used: BTreeSet<AppCapability> =
        matching.satisfied.iter().map(|&(_, cap)| cap).collect();
    matching.unused_capabilities = app
        .active_capabilities
        .difference(&used)
        .copied()
        .collect();

    matching
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyOutcome {
    /// The tester has not recorded a verdict for this step.
    NotYetValidated,
    Match,
    /// Mismatch reported; one bug was appended to the snapshot.
    MismatchRecorded,
}

/// Reads the tester's perception verdict for this snapshot. A pending
/// verdict records nothing; a mismatch appends one bug capturing the
/// expected and observed element sets. Side effects are confined to this
/// snapshot's own bug list.
pub fn check_ui_consistency(snapshot: &mut InteractionSnapshot) -> ConsistencyOutcome {
    match snapshot.user.perception {
        Perception::Unknown => ConsistencyOutcome::NotYetValidated,
        Perception::Match => ConsistencyOutcome::Match,
        Perception::Mismatch => {
            let note = snapshot.user.perception_note.clone().unwrap_or_default();
            snapshot.bugs.push(BugRecord::UiInconsistency {
                step: snapshot.step,
                expected_visible: snapshot.user.expected_visible.clone(),
                actual_visible: snapshot.app.visible_elements.clone(),
                note,
            });
            ConsistencyOutcome::MismatchRecorded
        }
    }
}

#[cfg(test)]
mod tests {
    use duet_contracts::common::{ElapsedNs, StepIndex, WallClockNs};
    use duet_contracts::vocab::PracticeMode;

    use super::*;

    #[test]
    fn at_ports_01_every_intent_has_a_distinct_partner() {
        let partners: BTreeSet<AppCapability> = UserIntent::ALL
            .iter()
            .map(|&intent| complementary_capability(intent))
            .collect();
        assert_eq!(partners.len(), UserIntent::ALL.len());
    }

    #[test]
    fn at_ports_02_single_pair_synchronizes() {
        let mut app = AppState::new(PracticeMode::FreeText);
        app.active_capabilities.insert(AppCapability::AcceptTextInput);
        let user = UserState::with_intents([UserIntent::WantEnterText]);

        let matching = compute_port_matching(&app, &user);
        let expected: BTreeSet<(UserIntent, AppCapability)> =
            [(UserIntent::WantEnterText, AppCapability::AcceptTextInput)]
                .into_iter()
                .collect();
        assert_eq!(matching.satisfied, expected);
        assert!(matching.unsatisfied_intents.is_empty());
        assert!(matching.unused_capabilities.is_empty());
    }

    #[test]
    fn at_ports_03_unmatched_sides_are_reported() {
        let mut app = AppState::new(PracticeMode::GuidedList);
        app.active_capabilities.insert(AppCapability::AcceptNavigationNext);
        app.active_capabilities.insert(AppCapability::AcceptFileUpload);
        let user =
            UserState::with_intents([UserIntent::WantGoNext, UserIntent::WantRecordAudio]);

        let matching = compute_port_matching(&app, &user);
        assert!(matching
            .satisfied
            .contains(&(UserIntent::WantGoNext, AppCapability::AcceptNavigationNext)));
        assert!(matching
            .unsatisfied_intents
            .contains(&UserIntent::WantRecordAudio));
        let leftover: BTreeSet<AppCapability> =
            [AppCapability::AcceptFileUpload].into_iter().collect();
        assert_eq!(matching.unused_capabilities, leftover);
    }

    #[test]
    fn at_ports_04_matching_is_idempotent() {
        let mut app = AppState::new(PracticeMode::GuidedList);
        app.active_capabilities.insert(AppCapability::AcceptNavigationPrev);
        app.active_capabilities.insert(AppCapability::ProvideAnalysisResults);
        let user =
            UserState::with_intents([UserIntent::WantGoPrevious, UserIntent::WantSeeResults]);

        let first = compute_port_matching(&app, &user);
        let second = compute_port_matching(&app, &user);
        assert_eq!(first, second);
    }

    #[test]
    fn at_ports_05_pending_verdict_records_nothing() {
        let snapshot = &mut InteractionSnapshot::new(
            StepIndex(0),
            WallClockNs(0),
            ElapsedNs(0),
            AppState::new(PracticeMode::FreeText),
            UserState::new(),
        );
        assert_eq!(
            check_ui_consistency(snapshot),
            ConsistencyOutcome::NotYetValidated
        );
        assert!(snapshot.bugs.is_empty());
    }

    #[test]
    fn at_ports_06_mismatch_appends_exactly_one_bug() {
        let mut user = UserState::new();
        user.expected_visible.insert(duet_contracts::vocab::UiElement::PhraseDisplayBold);
        user.perception = Perception::Mismatch;
        user.perception_note = Some("phrase not bold".to_string());

        let snapshot = &mut InteractionSnapshot::new(
            StepIndex(3),
            WallClockNs(0),
            ElapsedNs(0),
            AppState::new(PracticeMode::GuidedList),
            user,
        );
        assert_eq!(
            check_ui_consistency(snapshot),
            ConsistencyOutcome::MismatchRecorded
        );
        assert_eq!(snapshot.bugs.len(), 1);
        match &snapshot.bugs[0] {
            BugRecord::UiInconsistency { step, note, .. } => {
                assert_eq!(*step, StepIndex(3));
                assert_eq!(note, "phrase not bold");
            }
            other => panic!("expected UiInconsistency, got {other:?}"),
        }
    }
}
