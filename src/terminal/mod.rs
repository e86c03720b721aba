pub mod executor;
pub mod history;
pub mod manager;
pub mod session;
pub mod shortcuts;

pub use executor::{CommandCompletion, CommandExecutor, CommandOutcome, PendingCommand, SubmitRejection};
pub use history::Recall;
pub use manager::{SessionDefaults, SessionManager, Snapshot};
pub use session::{
    CommandTicket, EntryDraft, EntryId, OutputEntry, OutputKind, Session, SessionId, SessionPatch,
};
pub use shortcuts::{Dispatched, Key, KeyChord, KeyPhase, ShortcutAction, ShortcutDispatcher};
