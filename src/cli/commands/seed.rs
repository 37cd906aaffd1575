//! `sect seed` command - Load the demo dataset

use console::style;
use miette::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cli::commands::utils::open_db;
use crate::cli::helpers::{confirm, print_cancelled, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::seed::{load_demo, SeedSummary};

#[derive(clap::Args, Debug)]
pub struct SeedArgs {
    /// Replace existing data
    #[arg(long)]
    pub force: bool,

    /// RNG seed, for a reproducible dataset
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(args: SeedArgs, global: &GlobalOpts) -> Result<()> {
    let (ctx, mut db) = open_db(global)?;

    if args.force && !db.is_empty()? {
        let prompt = format!("Replace all data in {}?", ctx.db_path.display());
        if !confirm(&prompt, args.yes)? {
            print_cancelled();
            return Ok(());
        }
    }

    let summary = match args.seed {
        Some(seed) => load_demo(&mut db, args.force, &mut StdRng::seed_from_u64(seed))?,
        None => load_demo(&mut db, args.force, &mut rand::rng())?,
    };

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&summary, global.format),
        _ => {
            if !global.quiet {
                print_summary(&summary);
            }
            Ok(())
        }
    }
}

fn print_summary(summary: &SeedSummary) {
    println!("{} Loaded demo dataset", style("✓").green());
    let lines = [
        ("suppliers", summary.suppliers),
        ("campaigns", summary.campaigns),
        ("enrollments", summary.enrollments),
        ("IMDS submissions", summary.imds_submissions),
        ("PCF declarations", summary.pcf_declarations),
        ("users", summary.users),
    ];
    for (label, count) in lines {
        println!("  {:<18} {}", label, style(count).cyan());
    }
}
