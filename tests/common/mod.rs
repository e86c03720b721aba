#![allow(dead_code)]

use async_trait::async_trait;
use codemate_term::error::AppError;
use codemate_term::remote::{
    DashboardEndpoint, ExecuteRequest, ExecuteResponse, ExecutionEndpoint, FileEntry, SystemStats,
    WelcomeMessage,
};
use codemate_term::terminal::{SessionDefaults, SessionManager};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// In-memory backend. Replies are scripted per call; once the script runs out every
/// command echoes itself back as output.
pub struct StubEndpoint {
    replies: Mutex<VecDeque<Result<ExecuteResponse, String>>>,
    requests: Mutex<Vec<ExecuteRequest>>,
    /// When set, each `execute` waits for one permit before replying.
    gate: Option<Arc<Semaphore>>,
    files_fail: bool,
}

impl StubEndpoint {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
            files_fail: false,
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn with_failing_files(mut self) -> Self {
        self.files_fail = true;
        self
    }

    pub fn reply(self, response: ExecuteResponse) -> Self {
        self.replies.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<ExecuteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionEndpoint for StubEndpoint {
    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        let scripted = self.replies.lock().unwrap().pop_front();
        match scripted {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(AppError::InvalidResponse(message)),
            None => Ok(ExecuteResponse {
                output: Some(request.command.clone()),
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl DashboardEndpoint for StubEndpoint {
    async fn system_stats(&self) -> Result<SystemStats, AppError> {
        Ok(sample_stats())
    }

    async fn list_files(&self, path: &str) -> Result<Vec<FileEntry>, AppError> {
        if self.files_fail {
            return Err(AppError::InvalidResponse("listing unavailable".into()));
        }
        Ok(vec![FileEntry {
            name: "README.md".into(),
            path: format!("{}/README.md", path.trim_end_matches('/')),
            is_directory: false,
            size: Some(42),
            modified: None,
        }])
    }

    async fn welcome(&self) -> Result<WelcomeMessage, AppError> {
        Ok(WelcomeMessage {
            message: "stub welcome".into(),
            timestamp: None,
        })
    }
}

pub fn sample_stats() -> SystemStats {
    SystemStats {
        cpu_percent: 10.0,
        memory_percent: 20.0,
        memory_used: 2,
        memory_total: 10,
        disk_percent: 30.0,
        disk_used: 3,
        disk_total: 10,
        timestamp: "2024-05-01T12:00:00".into(),
    }
}

pub fn manager() -> SessionManager {
    SessionManager::new(SessionDefaults::default(), "Welcome to CodeMate.Server 🚀")
}
