use crate::config::Config;
use crate::remote::schemas::ExecuteRequest;
use crate::terminal::executor::{CommandCompletion, CommandOutcome, PendingCommand, SubmitRejection};
use crate::terminal::history::{self, Recall};
use crate::terminal::session::{
    is_valid_height, CommandTicket, EntryDraft, OutputKind, Session, SessionId, SessionPatch,
};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionDefaults {
    pub working_directory: String,
    pub display_height: f64,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            working_directory: ".".to_string(),
            display_height: 400.0,
        }
    }
}

impl From<&Config> for SessionDefaults {
    fn from(config: &Config) -> Self {
        Self {
            working_directory: config.default_working_directory.clone(),
            display_height: config.default_terminal_height,
        }
    }
}

/// Read-only view handed to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub sessions: Vec<Session>,
    pub active_id: SessionId,
}

/// Owns every terminal tab and the active-tab pointer.
///
/// There is always at least one session and `active_id` always names one of them.
/// Each mutation replaces a whole [`Session`] value; operations on unknown ids are
/// silent no-ops and report `false`.
#[derive(Debug, Clone)]
pub struct SessionManager {
    sessions: Vec<Session>,
    active_id: SessionId,
    defaults: SessionDefaults,
}

impl SessionManager {
    /// Starts with one session whose output holds `welcome` as its preamble.
    pub fn new(defaults: SessionDefaults, welcome: impl Into<String>) -> Self {
        let mut first = Session::new(
            "Terminal 1".to_string(),
            defaults.working_directory.clone(),
            defaults.display_height,
        );
        first.push_entry(EntryDraft::new(OutputKind::Output, welcome));
        let active_id = first.id;

        Self {
            sessions: vec![first],
            active_id,
            defaults,
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn active_id(&self) -> SessionId {
        self.active_id
    }

    pub fn active(&self) -> &Session {
        self.get(self.active_id).unwrap_or(&self.sessions[0])
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    fn position(&self, id: SessionId) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            sessions: self.sessions.clone(),
            active_id: self.active_id,
        }
    }

    pub fn add_session(&mut self) -> SessionId {
        let session = Session::new(
            format!("Terminal {}", self.sessions.len() + 1),
            self.defaults.working_directory.clone(),
            self.defaults.display_height,
        );
        let id = session.id;
        info!(session = %id, name = %session.name, "Session added");
        self.sessions.push(session);
        self.active_id = id;
        id
    }

    /// Removes the session unless it is the last one. Closing the active session
    /// activates the first remaining session.
    pub fn close_session(&mut self, id: SessionId) -> bool {
        if self.sessions.len() <= 1 {
            debug!(session = %id, "Refusing to close the last session");
            return false;
        }
        let Some(index) = self.position(id) else {
            debug!(session = %id, "Close ignored: unknown session");
            return false;
        };

        self.sessions.remove(index);
        if self.active_id == id {
            self.active_id = self.sessions[0].id;
        }
        info!(session = %id, active = %self.active_id, "Session closed");
        true
    }

    pub fn set_active(&mut self, id: SessionId) -> bool {
        if self.position(id).is_none() {
            debug!(session = %id, "Activate ignored: unknown session");
            return false;
        }
        self.active_id = id;
        true
    }

    /// Activates the session after the current one, wrapping to the first.
    pub fn activate_next(&mut self) -> SessionId {
        let current = self.position(self.active_id).unwrap_or(0);
        let next = (current + 1) % self.sessions.len();
        self.active_id = self.sessions[next].id;
        self.active_id
    }

    /// Activates the session before the current one, wrapping to the last.
    pub fn activate_previous(&mut self) -> SessionId {
        let len = self.sessions.len();
        let current = self.position(self.active_id).unwrap_or(0);
        let previous = (current + len - 1) % len;
        self.active_id = self.sessions[previous].id;
        self.active_id
    }

    pub fn toggle_minimize(&mut self, id: SessionId) -> bool {
        let Some(session) = self.get(id) else {
            debug!(session = %id, "Minimize ignored: unknown session");
            return false;
        };
        let minimized = !session.is_minimized;
        self.update_session(
            id,
            SessionPatch {
                is_minimized: Some(minimized),
                ..Default::default()
            },
        )
    }

    /// Sets the display height. Non-positive or non-finite heights are ignored.
    pub fn resize(&mut self, id: SessionId, height: f64) -> bool {
        if !is_valid_height(height) {
            debug!(session = %id, height, "Resize ignored: invalid height");
            return false;
        }
        self.update_session(
            id,
            SessionPatch {
                display_height: Some(height),
                ..Default::default()
            },
        )
    }

    /// Merges `patch` into the session as a single replacement. Unknown ids are ignored,
    /// which lets late results for closed sessions fall on the floor. A patch cannot
    /// touch the in-flight command ticket; only [`Self::apply_completion`] clears it.
    pub fn update_session(&mut self, id: SessionId, patch: SessionPatch) -> bool {
        let Some(index) = self.position(id) else {
            debug!(session = %id, "Update ignored: unknown session");
            return false;
        };
        self.sessions[index] = self.sessions[index].patched(patch);
        true
    }

    /// Truncates output to the preamble (first entry). History is untouched.
    pub fn clear_output(&mut self, id: SessionId) -> bool {
        let Some(index) = self.position(id) else {
            debug!(session = %id, "Clear ignored: unknown session");
            return false;
        };
        let mut next = self.sessions[index].clone();
        next.truncate_to_preamble();
        self.sessions[index] = next;
        true
    }

    pub fn recall_previous(&mut self, id: SessionId) -> Option<Recall> {
        let session = self.get(id)?;
        let recall = history::recall_previous(&session.command_history, session.history_index);
        self.commit_history_index(id, recall.index);
        Some(recall)
    }

    pub fn recall_next(&mut self, id: SessionId) -> Option<Recall> {
        let session = self.get(id)?;
        let recall = history::recall_next(&session.command_history, session.history_index);
        self.commit_history_index(id, recall.index);
        Some(recall)
    }

    fn commit_history_index(&mut self, id: SessionId, index: usize) {
        self.update_session(
            id,
            SessionPatch {
                history_index: Some(index),
                ..Default::default()
            },
        );
    }

    /// Synchronous half of a submission: echoes the command, records it in history,
    /// resets the recall cursor and marks the session as executing.
    pub fn begin_command(
        &mut self,
        id: SessionId,
        raw_command: &str,
    ) -> Result<PendingCommand, SubmitRejection> {
        if raw_command.trim().is_empty() {
            return Err(SubmitRejection::EmptyCommand);
        }
        let index = self.position(id).ok_or(SubmitRejection::SessionNotFound)?;
        if self.sessions[index].executing.is_some() {
            debug!(session = %id, "Submit rejected: a command is already executing");
            return Err(SubmitRejection::AlreadyExecuting);
        }

        let mut next = self.sessions[index].clone();
        let echo_id = next.push_entry(EntryDraft::new(OutputKind::Command, raw_command));
        next.command_history.push(raw_command.to_string());
        next.history_index = next.command_history.len();
        let ticket = CommandTicket(echo_id);
        next.executing = Some(ticket);

        let request = ExecuteRequest {
            command: raw_command.to_string(),
            working_directory: next.working_directory.clone(),
        };
        self.sessions[index] = next;

        Ok(PendingCommand {
            session_id: id,
            ticket,
            request,
        })
    }

    /// Commits a finished command in one update. Ignored if the session is gone or is
    /// not waiting on this ticket.
    pub fn apply_completion(&mut self, completion: CommandCompletion) -> bool {
        let Some(index) = self.position(completion.session_id) else {
            debug!(session = %completion.session_id, "Late completion for a closed session dropped");
            return false;
        };
        if self.sessions[index].executing != Some(completion.ticket) {
            debug!(
                session = %completion.session_id,
                ticket = ?completion.ticket,
                "Completion does not match the executing command; dropped"
            );
            return false;
        }

        let mut patch = SessionPatch::default();
        match completion.outcome {
            CommandOutcome::Completed(response) => {
                if let Some(output) = response.output.filter(|o| !o.is_empty()) {
                    patch.append_output.push(EntryDraft::new(OutputKind::Output, output));
                }
                if let Some(error) = response.error.filter(|e| !e.is_empty()) {
                    patch.append_output.push(EntryDraft::new(OutputKind::Error, error));
                }
                patch.working_directory = response.working_directory;
            }
            CommandOutcome::Failed { message } => {
                patch.append_output.push(EntryDraft::new(
                    OutputKind::Error,
                    format!("Error executing command: {}", message),
                ));
            }
        }
        let mut next = self.sessions[index].patched(patch);
        next.executing = None;
        self.sessions[index] = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::schemas::ExecuteResponse;

    fn manager() -> SessionManager {
        SessionManager::new(SessionDefaults::default(), "welcome")
    }

    #[test]
    fn starts_with_one_seeded_session() {
        let m = manager();
        assert_eq!(m.len(), 1);
        let s = m.active();
        assert_eq!(s.name(), "Terminal 1");
        assert_eq!(s.output().len(), 1);
        assert_eq!(s.output()[0].content, "welcome");
        assert_eq!(s.history_index(), 0);
        assert_eq!(s.display_height(), 400.0);
    }

    #[test]
    fn add_activates_and_names_by_count() {
        let mut m = manager();
        let id = m.add_session();
        assert_eq!(m.active_id(), id);
        assert_eq!(m.get(id).unwrap().name(), "Terminal 2");
        assert!(m.get(id).unwrap().output().is_empty());
    }

    #[test]
    fn close_active_moves_to_first_remaining() {
        let mut m = manager();
        let first = m.active_id();
        let second = m.add_session();
        let third = m.add_session();
        assert!(m.set_active(second));

        assert!(m.close_session(second));
        assert_eq!(m.active_id(), first);

        assert!(m.close_session(first));
        assert_eq!(m.active_id(), third);
        assert!(!m.close_session(third));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn close_inactive_keeps_active() {
        let mut m = manager();
        let first = m.active_id();
        let second = m.add_session();
        assert!(m.close_session(first));
        assert_eq!(m.active_id(), second);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut m = manager();
        let before = m.snapshot();
        let ghost = SessionId::new();
        assert!(!m.set_active(ghost));
        assert!(!m.toggle_minimize(ghost));
        assert!(!m.resize(ghost, 200.0));
        assert!(!m.clear_output(ghost));
        assert!(!m.close_session(ghost));
        assert!(m.recall_previous(ghost).is_none());
        assert_eq!(m.snapshot(), before);
    }

    #[test]
    fn resize_validates_height() {
        let mut m = manager();
        let id = m.active_id();
        assert!(!m.resize(id, 0.0));
        assert!(!m.resize(id, -5.0));
        assert!(m.resize(id, 250.0));
        assert_eq!(m.active().display_height(), 250.0);
    }

    #[test]
    fn toggle_minimize_only_touches_target() {
        let mut m = manager();
        let first = m.active_id();
        let second = m.add_session();
        assert!(m.toggle_minimize(first));
        assert!(m.get(first).unwrap().is_minimized());
        assert!(!m.get(second).unwrap().is_minimized());
        assert!(m.toggle_minimize(first));
        assert!(!m.get(first).unwrap().is_minimized());
    }

    #[test]
    fn wrap_around_switching() {
        let mut m = manager();
        let first = m.active_id();
        let second = m.add_session();
        let third = m.add_session();
        assert_eq!(m.activate_next(), first);
        assert_eq!(m.activate_previous(), third);
        assert_eq!(m.activate_previous(), second);
    }

    #[test]
    fn begin_command_echoes_before_completion() {
        let mut m = manager();
        let id = m.active_id();
        let pending = m.begin_command(id, "pwd").unwrap();
        let s = m.get(id).unwrap();
        assert_eq!(s.output().len(), 2);
        assert_eq!(s.output()[1].kind, OutputKind::Command);
        assert_eq!(s.output()[1].content, "pwd");
        assert_eq!(s.command_history().to_vec(), vec!["pwd".to_string()]);
        assert_eq!(s.history_index(), 1);
        assert_eq!(s.executing(), Some(pending.ticket));
        assert_eq!(pending.request.working_directory, ".");
    }

    #[test]
    fn completion_for_wrong_ticket_is_ignored() {
        let mut m = manager();
        let id = m.active_id();
        let pending = m.begin_command(id, "ls").unwrap();
        let stale = CommandCompletion {
            session_id: id,
            ticket: CommandTicket(pending.ticket.0 + 100),
            outcome: CommandOutcome::Completed(ExecuteResponse::default()),
        };
        assert!(!m.apply_completion(stale));
        assert!(m.active().is_executing());
    }

    #[test]
    fn update_session_cannot_strand_an_in_flight_command() {
        let mut m = manager();
        let id = m.active_id();
        let pending = m.begin_command(id, "slow").unwrap();

        assert!(m.update_session(
            id,
            SessionPatch {
                name: Some("build".to_string()),
                history_index: Some(0),
                working_directory: Some("/srv".to_string()),
                ..Default::default()
            }
        ));
        assert_eq!(m.active().executing(), Some(pending.ticket));

        assert!(m.apply_completion(CommandCompletion {
            session_id: id,
            ticket: pending.ticket,
            outcome: CommandOutcome::Completed(ExecuteResponse {
                output: Some("done".into()),
                ..Default::default()
            }),
        }));
        let s = m.active();
        assert!(!s.is_executing());
        assert_eq!(s.output().last().unwrap().content, "done");
        assert_eq!(s.name(), "build");
        assert_eq!(s.working_directory(), "/srv");
    }

    #[test]
    fn clear_keeps_preamble_and_history() {
        let mut m = manager();
        let id = m.active_id();
        for i in 0..4 {
            let pending = m.begin_command(id, &format!("echo {}", i)).unwrap();
            m.apply_completion(CommandCompletion {
                session_id: id,
                ticket: pending.ticket,
                outcome: CommandOutcome::Completed(ExecuteResponse {
                    output: Some(i.to_string()),
                    ..Default::default()
                }),
            });
        }
        assert_eq!(m.active().output().len(), 9);
        assert!(m.clear_output(id));
        assert_eq!(m.active().output().len(), 1);
        assert_eq!(m.active().output()[0].content, "welcome");
        assert_eq!(m.active().command_history().len(), 4);
    }
}
