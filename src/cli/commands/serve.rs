//! `sect serve` command - Run the HTTP API

use std::path::PathBuf;
use std::sync::Arc;

use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::Context;
use crate::cli::GlobalOpts;
use crate::core::logging::init_logging;
use crate::server::{self, AppState};

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (default: server.bind from config)
    #[arg(long, short = 'b')]
    pub bind: Option<String>,

    /// SQLite database file (default: database from config, else .sect/sect.db)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

pub fn run(args: ServeArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::resolve(global, args.db.as_deref())?;
    let mut config = ctx.config.clone();
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    config.database = Some(ctx.db_path.clone());

    init_logging(&config.log);

    let addr = server::parse_bind(&config.server.bind)?;
    let db = ctx.open_db()?;
    tracing::info!(
        database = %ctx.db_path.display(),
        chat_mode = ?config.chat.mode,
        enforce_roles = config.server.enforce_roles,
        "Opened database"
    );

    let state = Arc::new(AppState::new(db, config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    runtime.block_on(server::serve(state, addr))?;
    Ok(())
}
