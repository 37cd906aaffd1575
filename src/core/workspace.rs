//! Workspace discovery and layout

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Directory that marks a workspace root
pub const WORKSPACE_DIR: &str = ".sect";

/// A directory holding a `.sect/` folder with config and database
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Find the workspace by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current = std::env::current_dir().map_err(|e| WorkspaceError::Io(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }
            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Open an explicit workspace root without searching
    pub fn at(root: &Path) -> Result<Self, WorkspaceError> {
        let root = root
            .canonicalize()
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;
        if !root.join(WORKSPACE_DIR).is_dir() {
            return Err(WorkspaceError::NotFound {
                searched_from: root,
            });
        }
        Ok(Self { root })
    }

    /// Create `.sect/` with a commented config file
    pub fn init(path: &Path, force: bool) -> Result<Self, WorkspaceError> {
        std::fs::create_dir_all(path).map_err(|e| WorkspaceError::Io(e.to_string()))?;
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        let dir = root.join(WORKSPACE_DIR);
        if dir.exists() && !force {
            return Err(WorkspaceError::AlreadyExists(root));
        }

        std::fs::create_dir_all(&dir).map_err(|e| WorkspaceError::Io(e.to_string()))?;
        std::fs::write(dir.join("config.yaml"), Self::default_config())
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;
        std::fs::write(dir.join(".gitignore"), "sect.db\nsect.db-*\n")
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# SECT workspace configuration
# Values here override ~/.config/sect/config.yaml and are overridden by SECT_* env vars.

# database: .sect/sect.db

server:
  bind: 127.0.0.1:8000
  cors: true
  # Base URL used to build supplier portal links
  public_url: http://localhost:3000
  # Require an x-sect-user header on mutating endpoints
  enforce_roles: false

log:
  level: info
  json: false

chat:
  # mock answers locally; proxy forwards to `upstream`
  mode: mock
  # upstream: http://127.0.0.1:9000/chat
  timeout_secs: 60

portal:
  default_expiry_days: 30
"#
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.sect/` directory
    pub fn sect_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.sect_dir().join("config.yaml")
    }

    pub fn default_db_path(&self) -> PathBuf {
        self.sect_dir().join("sect.db")
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum WorkspaceError {
    #[error("not a SECT workspace (searched from {searched_from:?})")]
    #[diagnostic(
        code(sect::workspace::not_found),
        help("run `sect init` to create one, or pass --db to point at a database")
    )]
    NotFound { searched_from: PathBuf },

    #[error("SECT workspace already exists at {0:?}")]
    #[diagnostic(code(sect::workspace::exists), help("use --force to rewrite the config"))]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    #[diagnostic(code(sect::workspace::io))]
    Io(String),
}
