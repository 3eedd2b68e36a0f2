// fraglog - platform/signal.rs
//
// Ctrl+C / SIGTERM wiring for cooperative cancellation.
//
// A background thread runs a single-threaded tokio runtime that waits for
// the first shutdown signal and then sets the shared cancel flag. The event
// loop polls the flag before each read; nothing is interrupted mid-line.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Install the signal listener and return the flag it will set.
pub fn install() -> io::Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;

    std::thread::Builder::new()
        .name("signal-listener".to_string())
        .spawn(move || {
            runtime.block_on(async {
                match shutdown_signal().await {
                    Ok(()) => {
                        tracing::info!("Shutdown signal received; stopping after current line");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to listen for shutdown signals");
                        return;
                    }
                }
                flag.store(true, Ordering::SeqCst);
            });
        })?;

    Ok(cancel)
}

/// Resolves on the first Ctrl+C or SIGTERM.
#[cfg(unix)]
async fn shutdown_signal() -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = terminate.recv() => Ok(()),
    }
}

/// Resolves on the first Ctrl+C.
#[cfg(not(unix))]
async fn shutdown_signal() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}
