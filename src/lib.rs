pub mod bridge;
pub mod config;
pub mod error;
pub mod remote;
pub mod terminal;
