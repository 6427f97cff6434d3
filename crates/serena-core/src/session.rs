//! Session state and phase detection (§4.10).
//!
//! Tracks a bounded window of recent tool invocations and derives a
//! coarse "phase" from it, used to resolve `verbosity="auto"` into a
//! concrete level. Single mutex, constant-time operations, matching the
//! resource policy the rest of the crate follows for shared state.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

/// How the ring buffer window is sized.
const HISTORY_CAPACITY: usize = 20;
const EARLY_SESSION_THRESHOLD: usize = 3;
const FOCUSED_WORK_SAME_FILE_THRESHOLD: usize = 5;

/// Coarse classification of what a tool call did, used by the phase
/// detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallKind {
    Read,
    Search,
    Edit,
    Memory,
}

/// One entry in the session's recent-tool-call ring buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub kind: ToolCallKind,
    pub timestamp_millis: u64,
    pub affected_file: Option<String>,
}

impl ToolCallRecord {
    pub fn new(tool_name: impl Into<String>, kind: ToolCallKind, affected_file: Option<String>) -> Self {
        let timestamp_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            tool_name: tool_name.into(),
            kind,
            timestamp_millis,
            affected_file,
        }
    }
}

/// Derived phase of a working session, used to resolve `verbosity="auto"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Exploration,
    Implementation,
    FocusedWork,
}

impl Phase {
    /// The verbosity level recommended for this phase (§4.10).
    pub fn recommended_verbosity(self) -> &'static str {
        match self {
            Phase::Exploration => "minimal",
            Phase::Implementation => "normal",
            Phase::FocusedWork => "detailed",
        }
    }
}

/// The rule that produced a phase decision, echoed back in response
/// metadata so the resolution is never opaque to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseDecision {
    pub phase: Phase,
    pub verbosity: String,
    pub rule: String,
}

struct Inner {
    history: VecDeque<ToolCallRecord>,
}

/// Tracks recent tool invocations for one active session.
pub struct SessionState {
    inner: Mutex<Inner>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                history: VecDeque::with_capacity(HISTORY_CAPACITY),
            }),
        }
    }

    /// Record a tool invocation, evicting the oldest entry once the
    /// window is full.
    pub fn record(&self, record: ToolCallRecord) {
        let mut inner = self.inner.lock();
        if inner.history.len() >= HISTORY_CAPACITY {
            inner.history.pop_front();
        }
        inner.history.push_back(record);
    }

    /// Number of recorded calls currently in the window.
    pub fn len(&self) -> usize {
        self.inner.lock().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Derive the current phase and the rule that produced it.
    pub fn phase(&self) -> PhaseDecision {
        let inner = self.inner.lock();
        let history = &inner.history;

        if history.len() < EARLY_SESSION_THRESHOLD {
            return Self::decision(Phase::Exploration, "early session (<3 recorded calls)");
        }

        let mut reads = 0usize;
        let mut searches = 0usize;
        let mut edits = 0usize;
        let mut file_hits: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
        for record in history.iter() {
            match record.kind {
                ToolCallKind::Read => reads += 1,
                ToolCallKind::Search => searches += 1,
                ToolCallKind::Edit => edits += 1,
                ToolCallKind::Memory => {}
            }
            if let Some(file) = record.affected_file.as_deref() {
                *file_hits.entry(file).or_insert(0) += 1;
            }
        }

        if file_hits
            .values()
            .any(|count| *count >= FOCUSED_WORK_SAME_FILE_THRESHOLD)
        {
            return Self::decision(
                Phase::FocusedWork,
                "5+ recent operations touch the same file",
            );
        }

        if searches + reads >= 3 * edits {
            return Self::decision(Phase::Exploration, "searches+reads >= 3x edits");
        }

        if edits > searches {
            return Self::decision(Phase::Implementation, "edits > searches");
        }

        Self::decision(Phase::Exploration, "default")
    }

    fn decision(phase: Phase, rule: &str) -> PhaseDecision {
        PhaseDecision {
            phase,
            verbosity: phase.recommended_verbosity().to_string(),
            rule: rule.to_string(),
        }
    }

    /// Distinct files touched in the current window.
    pub fn distinct_files_recent(&self) -> usize {
        let inner = self.inner.lock();
        inner
            .history
            .iter()
            .filter_map(|r| r.affected_file.as_deref())
            .collect::<HashSet<_>>()
            .len()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: ToolCallKind, file: Option<&str>) -> ToolCallRecord {
        ToolCallRecord::new("tool", kind, file.map(|f| f.to_string()))
    }

    #[test]
    fn early_session_defaults_to_exploration() {
        let state = SessionState::new();
        state.record(record(ToolCallKind::Edit, None));
        let decision = state.phase();
        assert_eq!(decision.phase, Phase::Exploration);
        assert_eq!(decision.verbosity, "minimal");
    }

    #[test]
    fn many_reads_and_searches_is_exploration() {
        let state = SessionState::new();
        for _ in 0..6 {
            state.record(record(ToolCallKind::Read, None));
        }
        state.record(record(ToolCallKind::Edit, None));
        assert_eq!(state.phase().phase, Phase::Exploration);
    }

    #[test]
    fn more_edits_than_searches_is_implementation() {
        let state = SessionState::new();
        for _ in 0..4 {
            state.record(record(ToolCallKind::Edit, Some("a.rs")));
        }
        state.record(record(ToolCallKind::Search, None));
        assert_eq!(state.phase().phase, Phase::Implementation);
    }

    #[test]
    fn repeated_file_hits_force_focused_work() {
        let state = SessionState::new();
        for _ in 0..5 {
            state.record(record(ToolCallKind::Read, Some("a.rs")));
        }
        let decision = state.phase();
        assert_eq!(decision.phase, Phase::FocusedWork);
        assert_eq!(decision.verbosity, "detailed");
    }

    #[test]
    fn ring_buffer_evicts_oldest() {
        let state = SessionState::new();
        for i in 0..25 {
            state.record(record(ToolCallKind::Read, Some(&format!("f{i}"))));
        }
        assert_eq!(state.len(), HISTORY_CAPACITY);
    }
}
