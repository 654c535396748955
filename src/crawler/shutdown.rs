//! Shutdown coordinator
//!
//! Owns the root cancellation token of the process. Each pipeline run takes
//! a child of [`ShutdownCoordinator::token`]; the limit controller and the
//! run watchdog cancel that child, OS signals cancel the root. Either way the
//! producer and every worker observe one token.

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    root: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
        }
    }

    /// The root token, cancelled by signals or [`trigger`](Self::trigger)
    pub fn token(&self) -> &CancellationToken {
        &self.root
    }

    /// Requests shutdown; safe to call any number of times
    pub fn trigger(&self) {
        if !self.root.is_cancelled() {
            tracing::info!("Shutdown requested");
        }
        self.root.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Spawns a task that triggers shutdown on Ctrl+C or SIGTERM
    ///
    /// Further signals while the crawl drains are logged and otherwise
    /// ignored. The task runs until aborted.
    pub fn listen_for_signals(&self) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let name = wait_for_signal().await;
            tracing::info!(
                "Received {}, finishing in-flight fetches before exiting",
                name
            );
            coordinator.trigger();

            loop {
                let name = wait_for_signal().await;
                tracing::warn!("Received {} again, still draining", name);
                coordinator.trigger();
            }
        })
    }
}

/// Resolves on the next Ctrl+C or SIGTERM and names the signal
pub async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    }
}
