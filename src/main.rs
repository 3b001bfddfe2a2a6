//! Application entry point: Voice Code Assistant console.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run) and apply
//!    the `VOICE_CODE_BACKEND_URL` override.
//! 3. Create a single-threaded [`tokio`] runtime.
//! 4. Build the HTTP backend client and the [`SessionManager`].
//! 5. Spawn the event printer and the backend probe.
//! 6. Read stdin lines until `/quit` or end of input.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use voice_code_assistant::{
    app::{render_entry, render_event, ConsoleApp, Flow},
    backend::HttpBackend,
    config::AppConfig,
    session::{SessionEvent, SessionManager},
};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Voice Code Assistant starting");

    let file_config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    let config = file_config.clone().with_env_overrides();
    log::info!(
        "Backend: {} (history {})",
        config.backend.base_url,
        if config.backend.persistence_enabled { "on" } else { "off" }
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(run(config, file_config))
}

async fn run(config: AppConfig, file_config: AppConfig) -> anyhow::Result<()> {
    let backend = Arc::new(HttpBackend::from_config(&config.backend));
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let manager = SessionManager::new(&config, backend).with_events(event_tx);

    for entry in manager.transcript() {
        println!("{}", render_entry(&entry));
    }

    tokio::spawn(print_events(event_rx));

    let probe = manager.clone();
    tokio::spawn(async move {
        probe.check_backend().await;
    });

    let mut app = ConsoleApp::new(manager, file_config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if app.handle_line(&line).await == Flow::Quit {
            break;
        }
    }
    app.abandon_pending();

    log::info!("Voice Code Assistant shutting down");
    Ok(())
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<SessionEvent>) {
    while let Some(event) = rx.recv().await {
        if let Some(text) = render_event(&event) {
            println!("{text}");
        }
    }
}
