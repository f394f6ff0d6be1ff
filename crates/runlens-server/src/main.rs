use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use runlens_server::{default_forest, run_processing, ServerConfig, WebState};
use runlens_state::{SessionTable, UserRecord};
use runlens_tabs::{tab_tree, AthleteId};

#[derive(Parser)]
#[command(name = "runlens", version, about = "Personal activity analytics API")]
struct Cli {
    /// Path to a TOML config file (falls back to RUNLENS_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Run every tab's backend processing for one athlete.
    Process {
        #[arg(long)]
        athlete: AthleteId,
    },
    /// Manage sessions.
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },
    /// Print the tab tree as JSON.
    Tabs,
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Insert or replace a session row.
    Add {
        #[arg(long)]
        token: String,
        #[arg(long)]
        athlete: AthleteId,
        #[arg(long, default_value = "")]
        access_token: String,
        #[arg(long, default_value = "")]
        refresh_token: String,
        #[arg(long, default_value_t = 0)]
        expires_at: i64,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli
        .config
        .or_else(|| std::env::var_os("RUNLENS_CONFIG").map(PathBuf::from));
    let config = ServerConfig::load(config_path.as_deref())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => runlens_server::run(config, default_forest()).await?,
        Command::Process { athlete } => {
            let web = WebState::open(&config, default_forest())?;
            let report = tokio::task::spawn_blocking(move || {
                run_processing(
                    &web.forest,
                    web.activities.as_ref(),
                    &web.env,
                    &web.statuses,
                    athlete,
                )
            })
            .await??;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_complete() {
                anyhow::bail!("{} of {} tabs failed", report.failed.len(), report.total());
            }
        }
        Command::Session {
            action:
                SessionCommand::Add {
                    token,
                    athlete,
                    access_token,
                    refresh_token,
                    expires_at,
                },
        } => {
            let sessions = SessionTable::open(config.storage.sessions_file())?;
            sessions.upsert(UserRecord {
                session_token: token,
                athlete_id: athlete,
                access_token,
                refresh_token,
                expires_at,
            })?;
            println!("session stored for athlete {athlete}");
        }
        Command::Tabs => {
            println!("{}", serde_json::to_string_pretty(&tab_tree(&default_forest()))?);
        }
    }
    Ok(())
}
