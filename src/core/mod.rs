//! Core module - storage, configuration and shared plumbing

pub mod config;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod seed;
pub mod template;
pub mod workspace;

pub use config::{ChatMode, Config, ConfigError};
pub use db::Database;
pub use error::{DbError, DbResult};
pub use workspace::{Workspace, WorkspaceError};
