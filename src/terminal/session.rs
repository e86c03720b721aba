use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier of one terminal tab. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

pub type EntryId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Echo of a submitted command line.
    Command,
    /// Result text reported by the remote endpoint.
    Output,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputEntry {
    pub id: EntryId,
    pub kind: OutputKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// An entry to be appended; the session assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub kind: OutputKind,
    pub content: String,
}

impl EntryDraft {
    pub fn new(kind: OutputKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }
}

/// Marks the command a session is waiting on. Holds the id of that command's echo entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTicket(pub EntryId);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) name: String,
    pub(crate) output: Vec<OutputEntry>,
    pub(crate) command_history: Vec<String>,
    pub(crate) history_index: usize,
    pub(crate) working_directory: String,
    pub(crate) is_minimized: bool,
    pub(crate) display_height: f64,
    pub(crate) executing: Option<CommandTicket>,
    #[serde(skip)]
    next_entry_id: EntryId,
}

impl Session {
    pub(crate) fn new(name: String, working_directory: String, display_height: f64) -> Self {
        Self {
            id: SessionId::new(),
            name,
            output: Vec::new(),
            command_history: Vec::new(),
            history_index: 0,
            working_directory,
            is_minimized: false,
            display_height,
            executing: None,
            next_entry_id: 1,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output(&self) -> &[OutputEntry] {
        &self.output
    }

    pub fn command_history(&self) -> &[String] {
        &self.command_history
    }

    pub fn history_index(&self) -> usize {
        self.history_index
    }

    pub fn working_directory(&self) -> &str {
        &self.working_directory
    }

    pub fn is_minimized(&self) -> bool {
        self.is_minimized
    }

    pub fn display_height(&self) -> f64 {
        self.display_height
    }

    pub fn is_executing(&self) -> bool {
        self.executing.is_some()
    }

    pub fn executing(&self) -> Option<CommandTicket> {
        self.executing
    }

    /// Appends an entry with a fresh id. Timestamps never go backwards within a session.
    pub(crate) fn push_entry(&mut self, draft: EntryDraft) -> EntryId {
        let id = self.next_entry_id;
        self.next_entry_id += 1;

        let now = Utc::now();
        let timestamp = match self.output.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        self.output.push(OutputEntry {
            id,
            kind: draft.kind,
            content: draft.content,
            timestamp,
        });
        id
    }

    /// Returns a copy of this session with `patch` merged in.
    ///
    /// Output and history are append-only through a patch, and the in-flight ticket is
    /// never touched. The history cursor is
    /// clamped to `[0, len(history)]`, a non-positive height and a blank working
    /// directory are ignored.
    pub(crate) fn patched(&self, patch: SessionPatch) -> Session {
        let mut next = self.clone();

        if let Some(name) = patch.name {
            next.name = name;
        }
        for draft in patch.append_output {
            next.push_entry(draft);
        }
        next.command_history.extend(patch.append_history);
        if let Some(index) = patch.history_index {
            next.history_index = index;
        }
        next.history_index = next.history_index.min(next.command_history.len());

        if let Some(dir) = patch.working_directory.filter(|dir| !dir.trim().is_empty()) {
            next.working_directory = dir;
        }
        if let Some(minimized) = patch.is_minimized {
            next.is_minimized = minimized;
        }
        if let Some(height) = patch.display_height.filter(|h| is_valid_height(*h)) {
            next.display_height = height;
        }
        next
    }

    /// Keeps only the first output entry (the preamble).
    pub(crate) fn truncate_to_preamble(&mut self) {
        self.output.truncate(1);
    }
}

pub(crate) fn is_valid_height(height: f64) -> bool {
    height.is_finite() && height > 0.0
}

/// Fields to merge into a session as one state transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    pub name: Option<String>,
    pub append_output: Vec<EntryDraft>,
    pub append_history: Vec<String>,
    pub history_index: Option<usize>,
    pub working_directory: Option<String>,
    pub is_minimized: Option<bool>,
    pub display_height: Option<f64>,
}
