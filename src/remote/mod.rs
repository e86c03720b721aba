pub mod client;
pub mod schemas;

pub use client::{DashboardEndpoint, ExecutionEndpoint, RemoteClient};
pub use schemas::{ExecuteRequest, ExecuteResponse, FileEntry, SystemStats, WelcomeMessage};
