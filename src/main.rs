use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "srcwiki")]
#[command(
    version,
    about = "Incremental wiki documentation extractor for source-control checkouts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, help = "Path to a config file (overrides the project chain)")]
    config: Option<PathBuf>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize srcwiki in the current directory
    Init {
        #[arg(long, short, help = "Overwrite existing initialization")]
        force: bool,
        #[arg(long, help = "Collection name (defaults to the directory name)")]
        collection: Option<String>,
    },

    /// Parse the workspace and update the persisted document tree
    Build {
        #[arg(long, help = "Rebuild from scratch instead of merging into the persisted tree")]
        full: bool,
        #[arg(long, help = "Publish pages after building")]
        publish: bool,
    },

    /// Flatten the persisted tree and write wiki pages
    Publish,
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31msrcwiki encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }

        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init { force, collection } => {
            srcwiki::cli::commands::init::run(force, collection.as_deref())?;
        }
        Commands::Build { full, publish } => {
            let rt = Runtime::new()?;
            rt.block_on(srcwiki::cli::commands::build::run(config, full, publish))?;
        }
        Commands::Publish => {
            let rt = Runtime::new()?;
            rt.block_on(srcwiki::cli::commands::publish::run(config))?;
        }
    }

    Ok(())
}
