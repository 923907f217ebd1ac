mod commands;
mod credentials;
mod render;
mod session;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use shiftsync_core::MonthRange;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shiftsync", version)]
#[command(about = "Sync your ShiftWeb work schedule into your calendars")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Show every change and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Default)]
struct MonthArgs {
    /// First month (YYYY-MM, default: this month)
    #[arg(long)]
    from: Option<String>,

    /// Last month (YYYY-MM, default: next month)
    #[arg(long)]
    to: Option<String>,
}

impl MonthArgs {
    fn resolve(&self) -> Result<MonthRange> {
        Ok(MonthRange::resolve(
            self.from.as_deref(),
            self.to.as_deref(),
            Local::now().date_naive(),
        )?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch shifts and write them to every configured calendar (default)
    Sync {
        #[command(flatten)]
        months: MonthArgs,

        /// Only sync this calendar (by name)
        #[arg(short, long)]
        calendar: Option<String>,
    },
    /// Show what sync would change, without writing
    Status {
        #[command(flatten)]
        months: MonthArgs,

        /// Only check this calendar (by name)
        #[arg(short, long)]
        calendar: Option<String>,
    },
    /// Print scraped shifts
    List {
        #[command(flatten)]
        months: MonthArgs,

        /// Also export them to an .ics file
        #[arg(long)]
        ics: Option<PathBuf>,
    },
    /// Set up accounts and pick a calendar
    Setup,
    /// Move a sync target to another calendar
    Calendar {
        /// Sync target to change (by name)
        name: Option<String>,
    },
    /// Show configuration and paths
    Config,
    /// Show recent sync runs
    History,
}

/// Logs go to stderr so they never mix with the rendered diff.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,shiftsync_core=debug,shiftsync_caldav=debug,shiftsync_shiftweb=debug,shiftsync_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("SHIFTSYNC_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Sync {
        months: MonthArgs::default(),
        calendar: None,
    });

    match command {
        Commands::Sync { months, calendar } => {
            let range = months.resolve()?;
            commands::sync::run(session::load_config()?, range, calendar, cli.verbose).await
        }
        Commands::Status { months, calendar } => {
            let range = months.resolve()?;
            commands::status::run(session::load_config()?, range, calendar, cli.verbose).await
        }
        Commands::List { months, ics } => {
            let range = months.resolve()?;
            commands::list::run(session::load_config()?, range, ics).await
        }
        Commands::Setup => commands::setup::run().await,
        Commands::Calendar { name } => commands::calendar::run(name).await,
        Commands::Config => commands::config::run(),
        Commands::History => commands::history::run(),
    }
}
