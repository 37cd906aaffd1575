//! `sect completions` command - Shell completion scripts
//!
//! ```bash
//! source <(sect completions bash)
//! sect completions fish -o ~/.config/fish/completions/sect.fish
//! ```

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::Shell;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::{Cli, GlobalOpts};

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: CompletionsArgs, global: &GlobalOpts) -> Result<()> {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();

    match &args.output {
        Some(path) => {
            let mut file = File::create(path).into_diagnostic()?;
            clap_complete::generate(args.shell, &mut cmd, bin, &mut file);
            file.flush().into_diagnostic()?;
            if !global.quiet {
                println!(
                    "{} Wrote {} completions to {}",
                    style("✓").green(),
                    args.shell,
                    path.display()
                );
            }
        }
        None => clap_complete::generate(args.shell, &mut cmd, bin, &mut io::stdout()),
    }
    Ok(())
}
