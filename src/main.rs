// Log repair entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Ensure config files exist, load config
// 3. Import the event log named on the command line
// 4. Initialize AppState
// 5. Create mpsc channels
// 6. Spawn app logic task
// 7. Run the TUI event loop (blocking until user quits)
// 8. Cleanup on exit

use std::path::PathBuf;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

use logmend::app;
use logmend::config;
use logmend::eventlog;
use logmend::tui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("logmend starting up");

    // 2. Ensure config files exist, then load them
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let copied = config::ensure_config_files(&cwd).context("failed to prepare config files")?;
    for path in &copied {
        info!("copied default config to {}", path.display());
    }
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} passes, output prefix `{}`",
        config.passes.len(),
        config.export.output_prefix
    );

    // 3. Import the event log named on the command line
    let input_path = log_path_from_args()?;
    info!("importing event log from {}", input_path.display());
    let log = eventlog::import_log(&input_path)
        .with_context(|| format!("failed to import {}", input_path.display()))?;
    info!(
        "Imported {} traces, {} events",
        log.traces.len(),
        log.event_count()
    );

    // 4. Initialize AppState
    let app_state = app::AppState::new(config, log, input_path);

    // 5. Create mpsc channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    // 6. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 7. Run the TUI event loop (blocking until user quits)
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 8. Cleanup: wait for the app task to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("logmend shut down cleanly");
    Ok(())
}

/// The event log path is the first positional argument.
fn log_path_from_args() -> anyhow::Result<PathBuf> {
    match std::env::args().nth(1) {
        Some(arg) => Ok(PathBuf::from(arg)),
        None => anyhow::bail!("usage: logmend <event-log.xes|event-log.csv>"),
    }
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("logmend.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logmend=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
