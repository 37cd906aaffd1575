use clap::Parser;
use miette::Result;
use sect::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Restore default SIGPIPE so `sect sup list | head` exits quietly.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => sect::cli::commands::init::run(args),
        Commands::Serve(args) => sect::cli::commands::serve::run(args, &global),
        Commands::Seed(args) => sect::cli::commands::seed::run(args, &global),
        Commands::Sup(cmd) => sect::cli::commands::sup::run(cmd, &global),
        Commands::Campaign(cmd) => sect::cli::commands::campaign::run(cmd, &global),
        Commands::Token(cmd) => sect::cli::commands::token::run(cmd, &global),
        Commands::Status(args) => sect::cli::commands::status::run(args, &global),
        Commands::Completions(args) => sect::cli::commands::completions::run(args, &global),
    }
}
