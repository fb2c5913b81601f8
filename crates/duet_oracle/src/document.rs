#![forbid(unsafe_code)]

//! Persisted session document.
//!
//! A flat, ordered dump of one run: configuration, the full bug list, and
//! one entry per history snapshot. Field names and the SCREAMING_SNAKE
//! vocabulary names are a stable contract for downstream analysis tools;
//! the document is plain JSON with no binary framing.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use duet_contracts::common::{ContractViolation, SchemaVersion, Validate};
use duet_contracts::interaction::{BugKind, BugRecord, InteractionSnapshot};

pub const SESSION_DOCUMENT_VERSION: SchemaVersion = SchemaVersion(1);

#[derive(Debug)]
pub enum PersistError {
    Serialize(serde_json::Error),
    Io(std::io::Error),
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Serialize(e)
    }
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        PersistError::Io(e)
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Serialize(e) => write!(f, "session serialization failed: {e}"),
            PersistError::Io(e) => write!(f, "session write failed: {e}"),
        }
    }
}

impl std::error::Error for PersistError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    pub schema_version: u32,
    pub run_config: BTreeMap<String, String>,
    pub total_steps: u64,
    pub bugs_found: Vec<BugEntry>,
    pub state_history: Vec<SnapshotEntry>,
    /// SHA-256 hex of the serialized `state_history`, for downstream
    /// integrity checks on archived runs.
    pub history_digest_sha256: String,
}

/// Ingress gate for documents loaded from disk: a file produced by this
/// crate always passes; anything else is checked before tools trust it.
impl Validate for SessionDocument {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != SESSION_DOCUMENT_VERSION.0 {
            return Err(ContractViolation::InvalidValue {
                field: "session_document.schema_version",
                reason: "must match SESSION_DOCUMENT_VERSION",
            });
        }
        if self.total_steps != self.state_history.len() as u64 {
            return Err(ContractViolation::InvalidValue {
                field: "session_document.total_steps",
                reason: "must equal the number of history entries",
            });
        }
        for (position, entry) in self.state_history.iter().enumerate() {
            if entry.step != position as u64 {
                return Err(ContractViolation::InvalidValue {
                    field: "session_document.state_history.step",
                    reason: "steps must be contiguous from zero",
                });
            }
        }
        let mut last_step = 0u64;
        for bug in &self.bugs_found {
            if bug.step >= self.total_steps {
                return Err(ContractViolation::InvalidValue {
                    field: "session_document.bugs_found.step",
                    reason: "must reference a recorded step",
                });
            }
            if bug.step < last_step {
                return Err(ContractViolation::InvalidValue {
                    field: "session_document.bugs_found",
                    reason: "must be ordered by non-decreasing step",
                });
            }
            last_step = bug.step;
            let known_kind = bug.kind == BugKind::InvariantViolation.as_str()
                || bug.kind == BugKind::UiInconsistency.as_str();
            if !known_kind {
                return Err(ContractViolation::InvalidValue {
                    field: "session_document.bugs_found.kind",
                    reason: "must be INVARIANT_VIOLATION or UI_INCONSISTENCY",
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugEntry {
    pub step: u64,
    pub kind: String,
    pub violations: Vec<String>,
    pub expected_visible: Vec<String>,
    pub actual_visible: Vec<String>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortPairEntry {
    pub intent: String,
    pub capability: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppStateEntry {
    pub mode: String,
    pub current_text: Option<String>,
    pub phrase_list_size: u64,
    pub current_phrase_index: u64,
    pub has_recording: bool,
    pub has_results: bool,
    pub displayed_text: Option<String>,
    pub current_score: Option<f64>,
    pub recognized_text: Option<String>,
    pub settings: BTreeMap<String, String>,
    pub visible_elements: Vec<String>,
    pub active_capabilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStateEntry {
    pub active_intents: Vec<String>,
    pub expected_visible: Vec<String>,
    pub perception: String,
    pub perception_notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub step: u64,
    pub timestamp_ns: u64,
    pub time_since_last_transition_ns: u64,
    pub app_state: AppStateEntry,
    pub user_state: UserStateEntry,
    pub satisfied_interactions: Vec<PortPairEntry>,
    pub unsatisfied_user_intents: Vec<String>,
    pub unused_app_capabilities: Vec<String>,
    pub bugs_found_count: u64,
    pub invariant_violations: Vec<String>,
}

fn bug_entry(record: &BugRecord) -> BugEntry {
    match record {
        BugRecord::InvariantViolation {
            step,
            violations,
            note,
        } => BugEntry {
            step: step.0,
            kind: record.kind().as_str().to_string(),
            violations: violations.clone(),
            expected_visible: Vec::new(),
            actual_visible: Vec::new(),
            notes: note.clone(),
        },
        BugRecord::UiInconsistency {
            step,
            expected_visible,
            actual_visible,
            note,
        } => BugEntry {
            step: step.0,
            kind: record.kind().as_str().to_string(),
            violations: Vec::new(),
            expected_visible: expected_visible.iter().map(|e| e.as_str().to_string()).collect(),
            actual_visible: actual_visible.iter().map(|e| e.as_str().to_string()).collect(),
            notes: note.clone(),
        },
    }
}

fn snapshot_entry(snapshot: &InteractionSnapshot) -> SnapshotEntry {
    let app = &snapshot.app;
    let user = &snapshot.user;
    SnapshotEntry {
        step: snapshot.step.0,
        timestamp_ns: snapshot.timestamp.0,
        time_since_last_transition_ns: snapshot.elapsed_since_prev.0,
        app_state: AppStateEntry {
            mode: app.mode.as_str().to_string(),
            current_text: app.current_text.clone(),
            phrase_list_size: app.phrase_list.len() as u64,
            current_phrase_index: app.current_phrase_index as u64,
            has_recording: app.has_recording,
            has_results: app.has_results,
            displayed_text: app.displayed_text.clone(),
            current_score: app.current_score,
            recognized_text: app.recognized_text.clone(),
            settings: app.settings.clone(),
            visible_elements: app
                .visible_elements
                .iter()
                .map(|e| e.as_str().to_string())
                .collect(),
            active_capabilities: app
                .active_capabilities
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
        },
        user_state: UserStateEntry {
            active_intents: user
                .active_intents
                .iter()
                .map(|i| i.as_str().to_string())
                .collect(),
            expected_visible: user
                .expected_visible
                .iter()
                .map(|e| e.as_str().to_string())
                .collect(),
            perception: user.perception.as_str().to_string(),
            perception_notes: user.perception_note.clone().unwrap_or_default(),
        },
        satisfied_interactions: snapshot
            .satisfied
            .iter()
            .map(|&(intent, capability)| PortPairEntry {
                intent: intent.as_str().to_string(),
                capability: capability.as_str().to_string(),
            })
            .collect(),
        unsatisfied_user_intents: snapshot
            .unsatisfied_intents
            .iter()
            .map(|i| i.as_str().to_string())
            .collect(),
        unused_app_capabilities: snapshot
            .unused_capabilities
            .iter()
            .map(|c| c.as_str().to_string())
            .collect(),
        bugs_found_count: snapshot.bugs.len() as u64,
        invariant_violations: snapshot.app.check_invariants(),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

pub fn document_from_history(
    run_config: &BTreeMap<String, String>,
    history: &[InteractionSnapshot],
) -> Result<SessionDocument, PersistError> {
    let bugs_found: Vec<BugEntry> = history
        .iter()
        .flat_map(|snapshot| snapshot.bugs.iter().map(bug_entry))
        .collect();
    let state_history: Vec<SnapshotEntry> = history.iter().map(snapshot_entry).collect();
    let history_digest_sha256 = sha256_hex(&serde_json::to_vec(&state_history)?);

    Ok(SessionDocument {
        schema_version: SESSION_DOCUMENT_VERSION.0,
        run_config: run_config.clone(),
        total_steps: history.len() as u64,
        bugs_found,
        state_history,
        history_digest_sha256,
    })
}
