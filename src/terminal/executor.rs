use crate::remote::client::ExecutionEndpoint;
use crate::remote::schemas::{ExecuteRequest, ExecuteResponse};
use crate::terminal::manager::SessionManager;
use crate::terminal::session::{CommandTicket, SessionId};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, instrument, warn};

/// Why a submission was dropped before any network I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitRejection {
    /// Empty or whitespace-only command.
    EmptyCommand,
    SessionNotFound,
    /// The session already has a command in flight.
    AlreadyExecuting,
}

/// A command whose echo is already recorded and which now awaits the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub session_id: SessionId,
    pub ticket: CommandTicket,
    pub request: ExecuteRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The endpoint answered; fields are already normalized.
    Completed(ExecuteResponse),
    /// No usable response: transport error, bad status or malformed body.
    Failed { message: String },
}

/// The single state update produced by one executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCompletion {
    pub session_id: SessionId,
    pub ticket: CommandTicket,
    pub outcome: CommandOutcome,
}

#[derive(Clone)]
pub struct CommandExecutor {
    endpoint: Arc<dyn ExecutionEndpoint>,
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor").finish_non_exhaustive()
    }
}

impl CommandExecutor {
    pub fn new(endpoint: Arc<dyn ExecutionEndpoint>) -> Self {
        Self { endpoint }
    }

    /// Issues exactly one request for `pending`. Never fails: every error becomes
    /// a [`CommandOutcome::Failed`].
    #[instrument(skip(self, pending), fields(session = %pending.session_id, command = %pending.request.command))]
    pub async fn execute(&self, pending: PendingCommand) -> CommandCompletion {
        let outcome = match self.endpoint.execute(&pending.request).await {
            Ok(response) => {
                debug!(exit_code = ?response.exit_code, "Command completed");
                CommandOutcome::Completed(response.normalized())
            }
            Err(e) => {
                warn!(error = %e, "Command execution failed at the transport level");
                CommandOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };

        CommandCompletion {
            session_id: pending.session_id,
            ticket: pending.ticket,
            outcome,
        }
    }

    /// Records, executes and commits one command inline.
    ///
    /// Holds `manager` for the whole round trip; event loops should use [`Self::spawn`].
    pub async fn submit(
        &self,
        manager: &mut SessionManager,
        session_id: SessionId,
        raw_command: &str,
    ) -> Result<CommandTicket, SubmitRejection> {
        let pending = manager.begin_command(session_id, raw_command)?;
        let ticket = pending.ticket;
        let completion = self.execute(pending).await;
        manager.apply_completion(completion);
        Ok(ticket)
    }

    /// Records the command now and runs it on a background task. The completion is
    /// delivered as one message on `completions`.
    pub fn spawn<T>(
        &self,
        manager: &mut SessionManager,
        session_id: SessionId,
        raw_command: &str,
        completions: UnboundedSender<T>,
    ) -> Result<CommandTicket, SubmitRejection>
    where
        T: From<CommandCompletion> + Send + 'static,
    {
        let pending = manager.begin_command(session_id, raw_command)?;
        let ticket = pending.ticket;
        let executor = self.clone();

        tokio::spawn(async move {
            let completion = executor.execute(pending).await;
            if completions.send(T::from(completion)).is_err() {
                debug!(session = %session_id, "Completion receiver dropped; discarding result");
            }
        });
        Ok(ticket)
    }
}
