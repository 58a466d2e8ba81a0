use apival::cli::{Cli, Commands};
use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
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

    // Logs go to stderr so stdout stays clean for --format json
    let default_level = match (&cli.command, global.verbose) {
        (_, true) => "debug",
        (Commands::Serve(_), false) => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check(args) => apival::cli::commands::check::run(args, &global),
        Commands::Serve(args) => apival::cli::commands::serve::run(args, &global),
        Commands::Completions(args) => apival::cli::commands::completions::run(args),
    }
}
