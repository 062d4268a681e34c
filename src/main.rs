mod app;
mod commands;
mod render;
mod utils;

use anyhow::Result;
use calapp_core::config::AppConfig;
use calapp_core::view::CalendarView;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::app::App;

#[derive(Parser)]
#[command(name = "calapp")]
#[command(about = "Sign in to your shared calendar and manage its events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show who is signed in
    Status,
    /// List events in the current view
    Events {
        /// View to show (month, week, work_week, day, agenda). Defaults to the last one used.
        #[arg(short, long)]
        view: Option<CalendarView>,

        /// Date the view is positioned on (YYYY-MM-DD). Defaults to today.
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Create an event
    New {
        title: Option<String>,

        /// Start date/time (e.g., "2025-03-20T15:00")
        #[arg(short, long)]
        start: Option<String>,

        /// End date/time. Defaults to one hour after start.
        #[arg(short, long, conflicts_with = "duration")]
        end: Option<String>,

        /// Length of the event (e.g., "30m", "2h")
        #[arg(short, long)]
        duration: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Change an existing event
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        start: Option<String>,

        #[arg(short, long)]
        end: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Delete an event
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Show or change the default view
    View { view: Option<CalendarView> },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let app = App::new(&config)?;

    match cli.command {
        Commands::Login { email } => commands::auth::login(&app, email).await,
        Commands::Register { name, email } => commands::auth::register(&app, name, email).await,
        Commands::Logout => commands::auth::logout(&app).await,
        Commands::Status => commands::status::run(&app).await,
        Commands::Events { view, date } => commands::events::run(&app, view, date).await,
        Commands::New {
            title,
            start,
            end,
            duration,
            notes,
        } => commands::new::run(&app, title, start, end, duration, notes).await,
        Commands::Edit {
            id,
            title,
            start,
            end,
            notes,
        } => commands::edit::run(&app, id, title, start, end, notes).await,
        Commands::Delete { id, force } => commands::delete::run(&app, id, force).await,
        Commands::View { view } => commands::view::run(&app, view),
    }
}
