use crate::remote::schemas::{FileEntry, SystemStats};
use crate::terminal::{
    CommandCompletion, KeyChord, Session, SessionId, ShortcutAction, Snapshot, SubmitRejection,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecallDirection {
    Previous,
    Next,
}

/// One line read from the UI. Requests without an `id` target the active session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeRequest {
    Snapshot,
    AddSession,
    CloseSession {
        id: SessionId,
    },
    SetActive {
        id: SessionId,
    },
    ToggleMinimize {
        id: SessionId,
    },
    Resize {
        id: SessionId,
        height: f64,
    },
    ClearOutput {
        id: SessionId,
    },
    Submit {
        command: String,
        #[serde(default)]
        id: Option<SessionId>,
    },
    Recall {
        direction: RecallDirection,
        #[serde(default)]
        id: Option<SessionId>,
    },
    Key(KeyChord),
    SystemStats,
    ListFiles {
        path: String,
    },
}

/// One line written to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    Snapshot(Snapshot),
    SessionUpdated {
        session: Session,
    },
    Recall {
        id: SessionId,
        index: usize,
        text: String,
    },
    KeyHandled {
        action: ShortcutAction,
        prevent_default: bool,
    },
    SubmitRejected {
        reason: SubmitRejection,
    },
    SystemStats {
        stats: SystemStats,
    },
    Files {
        path: String,
        entries: Vec<FileEntry>,
    },
    Error {
        message: String,
    },
}

/// Results produced off the event loop and applied back on it.
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundEvent {
    CommandCompleted(CommandCompletion),
    SystemStats(SystemStats),
    Files {
        path: String,
        entries: Vec<FileEntry>,
    },
    RequestFailed {
        context: String,
        message: String,
    },
}

impl From<CommandCompletion> for BackgroundEvent {
    fn from(completion: CommandCompletion) -> Self {
        BackgroundEvent::CommandCompleted(completion)
    }
}
