use crate::config::Config;
use crate::error::AppError;
use crate::remote::schemas::{ExecuteRequest, ExecuteResponse, FileEntry, SystemStats, WelcomeMessage};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// The remote command-execution RPC. One call per submitted command.
#[async_trait]
pub trait ExecutionEndpoint: Send + Sync {
    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, AppError>;
}

/// The remaining read-only endpoints the dashboard polls.
#[async_trait]
pub trait DashboardEndpoint: ExecutionEndpoint {
    async fn system_stats(&self) -> Result<SystemStats, AppError>;
    async fn list_files(&self, path: &str) -> Result<Vec<FileEntry>, AppError>;
    async fn welcome(&self) -> Result<WelcomeMessage, AppError>;
}

#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RemoteClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Self::with_base_url(config.api_url.clone(), config.request_timeout)
    }

    pub fn with_base_url(mut base_url: Url, timeout: Duration) -> Result<Self, AppError> {
        if base_url.cannot_be_a_base() {
            return Err(AppError::InvalidUrl(base_url.to_string()));
        }
        // Url::join drops the last path segment unless it ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, relative: &str) -> Result<Url, AppError> {
        self.base_url
            .join(relative)
            .map_err(|e| AppError::InvalidUrl(format!("{}{}: {}", self.base_url, relative, e)))
    }

    /// `.` and the empty path list the backend's working directory.
    /// Other paths are appended segment by segment; an absolute path keeps its leading slash.
    pub fn files_url(&self, path: &str) -> Result<Url, AppError> {
        let mut url = self.endpoint("api/files/")?;
        let path = path.trim();
        if path.is_empty() || path == "." {
            return Ok(url);
        }

        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if path.starts_with('/') {
            segments.insert(0, "");
        }
        let raw = url.to_string();
        url.path_segments_mut()
            .map_err(|_| AppError::InvalidUrl(raw))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value, AppError> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| AppError::InvalidResponse(format!("body is not JSON: {}", e)))
    }
}

#[async_trait]
impl ExecutionEndpoint for RemoteClient {
    #[instrument(skip(self, request), fields(command = %request.command, cwd = %request.working_directory))]
    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, AppError> {
        let url = self.endpoint("execute")?;
        debug!(%url, "Sending command to remote endpoint");

        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| AppError::InvalidResponse(format!("body is not JSON: {}", e)))?;
        if !value.is_object() {
            return Err(AppError::InvalidResponse(format!(
                "expected a JSON object, got: {}",
                value
            )));
        }
        let parsed: ExecuteResponse = serde_json::from_value(value)
            .map_err(|e| AppError::InvalidResponse(e.to_string()))?;
        Ok(parsed.normalized())
    }
}

#[async_trait]
impl DashboardEndpoint for RemoteClient {
    #[instrument(skip(self))]
    async fn system_stats(&self) -> Result<SystemStats, AppError> {
        let value = self.get_json(self.endpoint("api/system-stats")?).await?;
        serde_json::from_value(value).map_err(|e| AppError::InvalidResponse(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn list_files(&self, path: &str) -> Result<Vec<FileEntry>, AppError> {
        let value = self.get_json(self.files_url(path)?).await?;
        if !value.is_array() {
            warn!(path = %path, "File listing response is not an array, treating as empty");
            return Ok(Vec::new());
        }
        serde_json::from_value(value).map_err(|e| AppError::InvalidResponse(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn welcome(&self) -> Result<WelcomeMessage, AppError> {
        let value = self.get_json(self.endpoint("api/welcome")?).await?;
        serde_json::from_value(value).map_err(|e| AppError::InvalidResponse(e.to_string()))
    }
}
