//! Shared utilities for CLI commands

use std::path::{Path, PathBuf};

use miette::Result;

use crate::cli::GlobalOpts;
use crate::core::{Config, Database, Workspace};

/// Workspace, layered config and database path for one invocation
pub struct Context {
    pub workspace: Option<Workspace>,
    pub config: Config,
    pub db_path: PathBuf,
}

impl Context {
    /// Resolve from `--workspace` (or discovery) and an optional `--db` override
    ///
    /// Outside a workspace the command still runs when a database path comes
    /// from `--db`, `SECT_DATABASE` or the global config.
    pub fn resolve(global: &GlobalOpts, db_override: Option<&Path>) -> Result<Self> {
        let workspace = match &global.workspace {
            Some(root) => Some(Workspace::at(root)?),
            None => Workspace::discover().ok(),
        };

        let config = Config::load(workspace.as_ref())?;

        let db_path = match db_override {
            Some(path) => path.to_path_buf(),
            None => match config.database_path(workspace.as_ref()) {
                Some(path) => path,
                None => Workspace::discover()?.default_db_path(),
            },
        };

        if global.verbose {
            eprintln!("database: {}", db_path.display());
        }

        Ok(Self {
            workspace,
            config,
            db_path,
        })
    }

    pub fn open_db(&self) -> Result<Database> {
        Ok(Database::open(&self.db_path)?)
    }
}

/// Open the database for a command that takes no `--db` flag
pub fn open_db(global: &GlobalOpts) -> Result<(Context, Database)> {
    let ctx = Context::resolve(global, None)?;
    let db = ctx.open_db()?;
    Ok((ctx, db))
}
