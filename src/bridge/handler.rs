use crate::bridge::messages::{BackgroundEvent, BridgeEvent, BridgeRequest, RecallDirection};
use crate::remote::client::{DashboardEndpoint, ExecutionEndpoint};
use crate::terminal::{
    CommandExecutor, SessionId, SessionManager, ShortcutDispatcher, SubmitRejection,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, instrument, warn};

/// Applies UI requests and background results to the session manager.
///
/// The handler is the only writer to its [`SessionManager`]; network work is
/// spawned and comes back as [`BackgroundEvent`]s on `background`.
pub struct BridgeHandler<E> {
    manager: SessionManager,
    executor: CommandExecutor,
    shortcuts: ShortcutDispatcher,
    endpoint: Arc<E>,
    background: UnboundedSender<BackgroundEvent>,
}

impl<E> BridgeHandler<E>
where
    E: DashboardEndpoint + 'static,
{
    pub fn new(
        manager: SessionManager,
        endpoint: Arc<E>,
        background: UnboundedSender<BackgroundEvent>,
    ) -> Self {
        let execution: Arc<dyn ExecutionEndpoint> = endpoint.clone();
        Self {
            manager,
            executor: CommandExecutor::new(execution),
            shortcuts: ShortcutDispatcher::new(),
            endpoint,
            background,
        }
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    /// Parses and handles one raw input line. Blank lines are ignored.
    pub fn handle_line(&mut self, line: &str) -> Vec<BridgeEvent> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        match serde_json::from_str::<BridgeRequest>(line) {
            Ok(request) => self.handle_request(request),
            Err(e) => {
                warn!(error = %e, "Unparsable bridge request");
                vec![BridgeEvent::Error {
                    message: format!("Invalid request: {}", e),
                }]
            }
        }
    }

    #[instrument(skip(self))]
    pub fn handle_request(&mut self, request: BridgeRequest) -> Vec<BridgeEvent> {
        match request {
            BridgeRequest::Snapshot => vec![self.snapshot()],
            BridgeRequest::AddSession => {
                self.manager.add_session();
                vec![self.snapshot()]
            }
            BridgeRequest::CloseSession { id } => {
                self.manager.close_session(id);
                vec![self.snapshot()]
            }
            BridgeRequest::SetActive { id } => {
                self.manager.set_active(id);
                vec![self.snapshot()]
            }
            BridgeRequest::ToggleMinimize { id } => {
                let changed = self.manager.toggle_minimize(id);
                self.session_updated_if(changed, id)
            }
            BridgeRequest::Resize { id, height } => {
                let changed = self.manager.resize(id, height);
                self.session_updated_if(changed, id)
            }
            BridgeRequest::ClearOutput { id } => {
                let changed = self.manager.clear_output(id);
                self.session_updated_if(changed, id)
            }
            BridgeRequest::Submit { command, id } => {
                let id = id.unwrap_or_else(|| self.manager.active_id());
                self.submit(id, &command)
            }
            BridgeRequest::Recall { direction, id } => {
                let id = id.unwrap_or_else(|| self.manager.active_id());
                let recall = match direction {
                    RecallDirection::Previous => self.manager.recall_previous(id),
                    RecallDirection::Next => self.manager.recall_next(id),
                };
                recall
                    .map(|r| BridgeEvent::Recall {
                        id,
                        index: r.index,
                        text: r.text,
                    })
                    .into_iter()
                    .collect()
            }
            BridgeRequest::Key(chord) => match self.shortcuts.dispatch(&mut self.manager, &chord) {
                Some(dispatched) => vec![
                    BridgeEvent::KeyHandled {
                        action: dispatched.action,
                        prevent_default: dispatched.prevent_default,
                    },
                    self.snapshot(),
                ],
                None => Vec::new(),
            },
            BridgeRequest::SystemStats => {
                self.spawn_stats_fetch();
                Vec::new()
            }
            BridgeRequest::ListFiles { path } => {
                self.spawn_files_fetch(path);
                Vec::new()
            }
        }
    }

    pub fn handle_background(&mut self, event: BackgroundEvent) -> Vec<BridgeEvent> {
        match event {
            BackgroundEvent::CommandCompleted(completion) => {
                let id = completion.session_id;
                let applied = self.manager.apply_completion(completion);
                self.session_updated_if(applied, id)
            }
            BackgroundEvent::SystemStats(stats) => vec![BridgeEvent::SystemStats { stats }],
            BackgroundEvent::Files { path, entries } => vec![BridgeEvent::Files { path, entries }],
            BackgroundEvent::RequestFailed { context, message } => vec![BridgeEvent::Error {
                message: format!("{} failed: {}", context, message),
            }],
        }
    }

    fn submit(&mut self, id: SessionId, command: &str) -> Vec<BridgeEvent> {
        match self
            .executor
            .spawn(&mut self.manager, id, command, self.background.clone())
        {
            Ok(_) => self.session_updated_if(true, id),
            Err(SubmitRejection::EmptyCommand) => Vec::new(),
            Err(reason) => {
                debug!(session = %id, ?reason, "Submit rejected");
                vec![BridgeEvent::SubmitRejected { reason }]
            }
        }
    }

    fn snapshot(&self) -> BridgeEvent {
        BridgeEvent::Snapshot(self.manager.snapshot())
    }

    fn session_updated_if(&self, changed: bool, id: SessionId) -> Vec<BridgeEvent> {
        if !changed {
            return Vec::new();
        }
        self.manager
            .get(id)
            .map(|session| BridgeEvent::SessionUpdated {
                session: session.clone(),
            })
            .into_iter()
            .collect()
    }

    fn spawn_stats_fetch(&self) {
        let endpoint = self.endpoint.clone();
        let background = self.background.clone();
        tokio::spawn(async move {
            let event = match endpoint.system_stats().await {
                Ok(stats) => BackgroundEvent::SystemStats(stats),
                Err(e) => {
                    warn!(error = %e, "Fetching system stats failed");
                    BackgroundEvent::RequestFailed {
                        context: "system stats".to_string(),
                        message: e.to_string(),
                    }
                }
            };
            if background.send(event).is_err() {
                debug!("Event loop gone; discarding system stats");
            }
        });
    }

    /// A failed listing reads as an empty directory.
    fn spawn_files_fetch(&self, path: String) {
        let endpoint = self.endpoint.clone();
        let background = self.background.clone();
        tokio::spawn(async move {
            let entries = match endpoint.list_files(&path).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path, error = %e, "Listing files failed");
                    Vec::new()
                }
            };
            if background
                .send(BackgroundEvent::Files { path, entries })
                .is_err()
            {
                debug!("Event loop gone; discarding file listing");
            }
        });
    }
}
