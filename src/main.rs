//! Arcade session binary: reads commands and hits from stdin, writes snapshots to stdout.

use anyhow::Context;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinError;
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arcade_session::{
    config::SessionConfig,
    dto::session::{EVENT_SESSION_STATE, OutboundEvent, SessionSnapshot},
    services::{
        capture::TracingCapture,
        console::parse_command,
        session_driver::{self, DEFAULT_TICK_PERIOD, SessionHandle},
    },
    state::{GameSession, SessionState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = SessionConfig::load().context("loading session config")?;
    let session = GameSession::new(config, Box::new(TracingCapture));
    let (driver, handle) = session_driver::channel(session, DEFAULT_TICK_PERIOD);

    let printer = tokio::spawn(print_snapshots(handle.states()));
    let reader = tokio::spawn(read_commands(handle));

    // The driver owns the non-Send session, so it runs on the main task.
    // It stops once the reader has returned and dropped the only handle.
    tokio::select! {
        _ = driver.run() => match task_failure(reader.await) {
            Some(err) => warn!(error = %err, "console reader failed; session finished"),
            None => info!("input closed; session finished"),
        },
        _ = shutdown_signal() => {
            info!("shutdown requested");
            reader.abort();
        }
    }

    if let Some(err) = task_failure(printer.await) {
        warn!(error = %err, "snapshot printer failed");
    }

    Ok(())
}

/// Describe why a background task did not complete cleanly, if it did not.
fn task_failure(result: Result<anyhow::Result<()>, JoinError>) -> Option<String> {
    match result {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(format!("{err:#}")),
        Err(err) => Some(err.to_string()),
    }
}

/// Forward console lines to the session until stdin closes.
async fn read_commands(handle: SessionHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(command) => {
                if handle.send(command).is_err() {
                    break;
                }
            }
            Err(err) => warn!(input = %line, error = %err, "ignoring console input"),
        }
    }
    Ok(())
}

/// Write each snapshot to stdout as an `event:`/`data:` frame.
async fn print_snapshots(mut states: WatchStream<SessionState>) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(state) = states.next().await {
        let snapshot = SessionSnapshot::from(&state);
        match OutboundEvent::json(EVENT_SESSION_STATE, &snapshot) {
            Ok(event) => {
                stdout
                    .write_all(event.to_frame().as_bytes())
                    .await
                    .context("writing snapshot")?;
                stdout.flush().await.context("flushing stdout")?;
            }
            Err(err) => warn!(error = %err, "failed to serialize session snapshot"),
        }
    }
    Ok(())
}

/// Configure tracing subscribers; logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
