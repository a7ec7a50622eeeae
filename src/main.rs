use clap::{Parser, Subcommand};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::RwLock;

use spacebar::app_state::AppState;
use spacebar::commands;
use spacebar::logging;
use spacebar::repl::readline;
use spacebar::watcher;

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();
    let state = Arc::new(RwLock::new(AppState::new()));

    // Initialize file index and start directory watcher
    let watcher_task = watcher::init_watcher(Arc::clone(&state)).await;
    state.write().await.watcher_task = Some(watcher_task);

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, Arc::clone(&state)).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    let mut s = state.write().await;
    s.stop_session();
    if let Some(task) = s.log_tail_task.take() {
        task.abort();
    }
    if let Some(task) = s.watcher_task.take() {
        task.abort();
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "spacebar check tracker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    ParseFile {
        #[arg(short, long)]
        path: String,
    },
    Start,
    Stop,
    Status,
    Config,
    SetThreshold {
        #[arg(short, long)]
        value: u32,
    },
    SetNotify {
        #[arg(short, long, action = clap::ArgAction::Set)]
        enabled: bool,
    },
    SetDuplicates {
        #[arg(short, long, action = clap::ArgAction::Set)]
        enabled: bool,
    },
    SetDirectory {
        #[arg(short, long)]
        path: String,
    },
    ListFiles,
    Exit,
}

async fn respond(line: &str, state: Arc<RwLock<AppState>>) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "spacebar".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::ParseFile { path }) => commands::parse_file(path, state)
            .await
            .map_err(|e| e.to_string())?,
        Some(Commands::Start) => commands::start_session(state).await,
        Some(Commands::Stop) => commands::stop_session(state).await,
        Some(Commands::Status) => commands::show_status(state).await,
        Some(Commands::Config) => commands::show_settings(state).await,
        Some(Commands::SetThreshold { value }) => commands::set_threshold(*value, state).await,
        Some(Commands::SetNotify { enabled }) => commands::set_notify(*enabled, state).await,
        Some(Commands::SetDuplicates { enabled }) => {
            commands::set_duplicates(*enabled, state).await
        }
        Some(Commands::SetDirectory { path }) => commands::set_directory(path, state).await,
        Some(Commands::ListFiles) => commands::list_files(state).await,
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
