#![forbid(unsafe_code)]

//! Read-only viewer for persisted session documents.

use std::env;
use std::fmt::Write as _;
use std::fs;

use duet_contracts::Validate;
use duet_oracle::document::{SessionDocument, SnapshotEntry};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let path = match args.as_slice() {
        [path] => path,
        _ => return Err("usage: duet_replay <session.json>".to_string()),
    };

    let raw = fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
    let document: SessionDocument =
        serde_json::from_str(&raw).map_err(|e| format!("{path}: {e}"))?;
    document
        .validate()
        .map_err(|v| format!("{path}: invalid session document: {v:?}"))?;

    print!("{}", render_report(&document));
    Ok(())
}

fn render_report(document: &SessionDocument) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "SESSION REPORT (schema v{})", document.schema_version);
    let _ = writeln!(out, "  total steps: {}", document.total_steps);
    let _ = writeln!(out, "  bugs found: {}", document.bugs_found.len());
    if !document.run_config.is_empty() {
        let _ = writeln!(out, "  run config:");
        for (key, value) in &document.run_config {
            let _ = writeln!(out, "    {key} = {value}");
        }
    }

    for entry in &document.state_history {
        render_step(&mut out, entry);
    }

    if !document.bugs_found.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "BUGS");
        for (number, bug) in document.bugs_found.iter().enumerate() {
            let _ = writeln!(
                out,
                "  #{} step {} {}",
                number + 1,
                bug.step,
                bug.kind
            );
            for violation in &bug.violations {
                let _ = writeln!(out, "    - {violation}");
            }
            if !bug.notes.is_empty() {
                let _ = writeln!(out, "    notes: {}", bug.notes);
            }
        }
    }

    out
}

fn render_step(out: &mut String, entry: &SnapshotEntry) {
    let _ = writeln!(out);
    let _ = writeln!(out, "STEP {}", entry.step);
    let _ = writeln!(out, "  mode: {}", entry.app_state.mode);
    let _ = writeln!(
        out,
        "  visible elements: {}",
        entry.app_state.visible_elements.len()
    );
    let _ = writeln!(
        out,
        "  active intents: {}",
        entry.user_state.active_intents.len()
    );

    let _ = writeln!(out, "  satisfied: {}", entry.satisfied_interactions.len());
    for pair in &entry.satisfied_interactions {
        let _ = writeln!(out, "    {} <-> {}", pair.intent, pair.capability);
    }
    let _ = writeln!(
        out,
        "  unsatisfied intents: {}",
        entry.unsatisfied_user_intents.len()
    );
    for intent in &entry.unsatisfied_user_intents {
        let _ = writeln!(out, "    - {intent}");
    }
    let _ = writeln!(
        out,
        "  unused capabilities: {}",
        entry.unused_app_capabilities.len()
    );
    for capability in &entry.unused_app_capabilities {
        let _ = writeln!(out, "    - {capability}");
    }

    if entry.user_state.perception != "UNKNOWN" {
        if entry.user_state.perception_notes.is_empty() {
            let _ = writeln!(out, "  perception: {}", entry.user_state.perception);
        } else {
            let _ = writeln!(
                out,
                "  perception: {} (notes: {})",
                entry.user_state.perception, entry.user_state.perception_notes
            );
        }
    }

    if !entry.invariant_violations.is_empty() {
        let _ = writeln!(out, "  invariant violations:");
        for violation in &entry.invariant_violations {
            let _ = writeln!(out, "    - {violation}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use duet_contracts::common::WallClockNs;
    use duet_contracts::state::{AppState, UserState};
    use duet_contracts::vocab::{AppCapability, PracticeMode, UserIntent};
    use duet_oracle::session::TestOracle;

    use super::*;

    fn sample_document() -> SessionDocument {
        let run_config =
            BTreeMap::from([("app_version".to_string(), "2.3.1".to_string())]);
        let mut oracle = TestOracle::with_run_config(run_config);

        let mut app = AppState::new(PracticeMode::FreeText);
        app.active_capabilities.insert(AppCapability::AcceptTextInput);
        oracle.transition(
            app,
            UserState::with_intents([UserIntent::WantEnterText]),
            WallClockNs(1_000),
        );
        oracle
            .user_validation(false, Some("input field missing".to_string()))
            .unwrap();
        oracle.to_document().unwrap()
    }

    #[test]
    fn at_replay_01_report_carries_steps_pairs_and_bugs() {
        let report = render_report(&sample_document());
        assert!(report.contains("STEP 0"));
        assert!(report.contains("WANT_ENTER_TEXT <-> ACCEPT_TEXT_INPUT"));
        assert!(report.contains("perception: MISMATCH"));
        assert!(report.contains("UI_INCONSISTENCY"));
        assert!(report.contains("input field missing"));
        assert!(report.contains("app_version = 2.3.1"));
    }
}
