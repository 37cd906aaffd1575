//! `sect init` command - Initialize a new SECT workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::{Config, Database, Workspace, WorkspaceError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Rewrite the config even if .sect/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    let workspace = match Workspace::init(&path, args.force) {
        Ok(workspace) => workspace,
        Err(WorkspaceError::AlreadyExists(root)) => {
            println!(
                "{} SECT workspace already exists at {}",
                style("!").yellow(),
                style(root.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("sect init --force").yellow());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let config = Config::load(Some(&workspace))?;
    let db_path = config
        .database_path(Some(&workspace))
        .unwrap_or_else(|| workspace.default_db_path());
    Database::open(&db_path)?;

    println!(
        "{} Initialized SECT workspace at {}",
        style("✓").green(),
        style(workspace.root().display()).cyan()
    );
    println!("  config:   {}", style(workspace.config_path().display()).dim());
    println!("  database: {}", style(db_path.display()).dim());
    println!();
    println!("Next steps:");
    println!("  {} Load the demo dataset", style("sect seed").yellow());
    println!("  {} List suppliers", style("sect sup list").yellow());
    println!("  {} Start the API", style("sect serve").yellow());
    Ok(())
}
