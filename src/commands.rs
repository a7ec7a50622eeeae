use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use crate::app_state::AppState;
use crate::error::ReaderError;
use crate::reader::Reader;
use tokio::sync::RwLock;

/// Make `path` the active chat log: replay what it already holds, then follow it.
pub async fn parse_file(path: &str, state: Arc<RwLock<AppState>>) -> Result<(), ReaderError> {
    let timer = Instant::now();
    let mut s = state.write().await;

    // Stop any current tailing task and end the old session
    if let Some(active_tail) = s.log_tail_task.take() {
        active_tail.abort();
    }
    if s.session_active {
        s.stop_session();
    }
    let active_path = s.set_active_file(path);
    drop(s);

    let reader = Reader::from(active_path.clone(), Arc::clone(&state));
    let parsed = reader.read_log_file()?;
    let message_count = parsed.messages.len();

    {
        let mut s = state.write().await;
        s.current_byte = Some(parsed.end_pos);
        s.current_line = parsed.line_count;
        s.start_session();
        s.replay_messages(parsed.messages);
    }

    println!(
        "replayed {} messages in {}ms",
        message_count,
        timer.elapsed().as_millis()
    );
    tracing::info!(
        path = %active_path.display(),
        messages = message_count,
        "Chat log loaded"
    );

    println!("tailing file: {}", active_path.display());
    let handle = tokio::spawn(async move {
        if let Err(e) = reader.tail_log_file().await {
            tracing::error!(error = %e, "Chat log tail stopped");
        }
    });
    state.write().await.log_tail_task = Some(handle);
    Ok(())
}

pub async fn start_session(state: Arc<RwLock<AppState>>) {
    let mut s = state.write().await;
    s.start_session();
    println!("spacebar tracking started");
}

pub async fn stop_session(state: Arc<RwLock<AppState>>) {
    let mut s = state.write().await;
    s.stop_session();
    println!("spacebar tracking stopped");
}

pub async fn show_status(state: Arc<RwLock<AppState>>) {
    let s = state.read().await;

    match &s.active_file {
        Some(path) => println!("Active file: {}", path.display()),
        None => println!("Active file: none"),
    }
    if let Some(date) = s.chat_session_date {
        println!("Session date: {date}");
    }
    println!(
        "Tracking: {}",
        if s.session_active { "on" } else { "off" }
    );

    let runs = s.tracker.active_runs();
    if runs.is_empty() {
        println!("No runs in progress");
    }
    for (channel, count) in runs {
        println!(
            "  {:<16} run of {:<4} [{}]",
            channel.display_name(),
            count,
            s.tracker.contributors(channel).join(", ")
        );
    }

    for (_, counter) in s.host.board.entries() {
        println!("  Counter: {} {}", counter.display_text, counter.count);
    }
}

pub async fn show_settings(state: Arc<RwLock<AppState>>) {
    let s = state.read().await;
    let tracker = &s.config.tracker;
    println!("Log directory:      {}", s.config.log_directory);
    println!("Minimum run start:  {}", tracker.min_run_start);
    println!("Notify on start:    {}", tracker.notify_on_start);
    println!("Duplicates allowed: {}", tracker.duplicates_allowed);
}

pub async fn set_threshold(value: u32, state: Arc<RwLock<AppState>>) {
    let mut s = state.write().await;
    s.config.tracker.min_run_start = value.max(1);
    save_config(&s);
    println!("Minimum run start set to {}", s.config.tracker.min_run_start);
}

pub async fn set_notify(enabled: bool, state: Arc<RwLock<AppState>>) {
    let mut s = state.write().await;
    s.config.tracker.notify_on_start = enabled;
    save_config(&s);
    println!("Notify on start set to {enabled}");
}

pub async fn set_duplicates(enabled: bool, state: Arc<RwLock<AppState>>) {
    let mut s = state.write().await;
    s.config.tracker.duplicates_allowed = enabled;
    save_config(&s);
    println!("Duplicates allowed set to {enabled}");
}

pub async fn set_directory(path: &str, state: Arc<RwLock<AppState>>) {
    let mut s = state.write().await;
    s.config.log_directory = path.to_string();
    save_config(&s);
    println!("Log directory set to {path} (restart to watch it)");
}

fn save_config(s: &AppState) {
    if let Err(e) = s.config.save() {
        tracing::error!(error = %e, "Failed to save configuration");
        println!("Failed to save configuration: {e}");
    }
}

pub fn exit() {
    let mut out = std::io::stdout();
    let _ = write!(out, "quitting...");
    let _ = out.flush();
}

pub async fn list_files(state: Arc<RwLock<AppState>>) {
    let s = state.read().await;
    let index = match &s.file_index {
        Some(idx) => idx,
        None => {
            println!("No file index available");
            return;
        }
    };

    if index.is_empty() {
        println!("No chat logs found");
        return;
    }

    println!("{:<45} {}", "File", "Started");
    println!("{}", "-".repeat(80));

    for entry in index.entries() {
        let empty_marker = if entry.is_empty { " (empty)" } else { "" };
        println!(
            "{:<45} {}{}",
            entry.filename,
            entry.display_name(),
            empty_marker
        );
    }

    println!("\nTotal: {} files", index.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat_models::ChatChannel;
    use crate::config::AppConfig;
    use std::fs;

    fn shared_state(log_directory: &str) -> Arc<RwLock<AppState>> {
        let mut app = AppState::with_config(AppConfig {
            log_directory: log_directory.to_string(),
            ..Default::default()
        });
        app.host.muted = true;
        Arc::new(RwLock::new(app))
    }

    #[tokio::test]
    async fn test_parse_file_replays_and_starts_session() {
        let dir = tempfile::tempdir().unwrap();
        let name = "chat_2025-03-14_20_15_00_000000.txt";
        fs::write(
            dir.path().join(name),
            "[20:15:01] public alice: \n[20:15:02] public bob: \n[20:15:03] public carol: \n",
        )
        .unwrap();

        let state = shared_state(&dir.path().to_string_lossy());
        parse_file(name, Arc::clone(&state)).await.unwrap();

        let mut s = state.write().await;
        assert!(s.session_active);
        assert_eq!(s.tracker.run_count(ChatChannel::Public), 3);
        assert_eq!(s.host.board.get(ChatChannel::Public).unwrap().count, 3);
        assert!(s.current_byte.unwrap() > 0);
        assert_eq!(s.current_line, 3);
        if let Some(task) = s.log_tail_task.take() {
            task.abort();
        }
    }

    #[tokio::test]
    async fn test_switching_files_resets_runs() {
        let dir = tempfile::tempdir().unwrap();
        let first = "chat_2025-03-14_20_15_00_000000.txt";
        let second = "chat_2025-03-14_21_00_00_000000.txt";
        fs::write(
            dir.path().join(first),
            "[20:15:01] clan alice: \n[20:15:02] clan bob: \n[20:15:03] clan carol: \n",
        )
        .unwrap();
        fs::write(dir.path().join(second), "[21:00:01] public dave: \n").unwrap();

        let state = shared_state(&dir.path().to_string_lossy());
        parse_file(first, Arc::clone(&state)).await.unwrap();
        parse_file(second, Arc::clone(&state)).await.unwrap();

        let mut s = state.write().await;
        assert_eq!(s.tracker.run_count(ChatChannel::ClanChat), 0);
        assert!(s.host.board.get(ChatChannel::ClanChat).is_none());
        assert_eq!(s.tracker.run_count(ChatChannel::Public), 1);
        if let Some(task) = s.log_tail_task.take() {
            task.abort();
        }
    }

    #[tokio::test]
    async fn test_parse_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = shared_state(&dir.path().to_string_lossy());
        let result = parse_file("chat_2025-03-14_20_15_00_000000.txt", state).await;
        assert!(matches!(result, Err(ReaderError::Open { .. })));
    }
}
