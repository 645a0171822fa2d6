//! Graceful shutdown for long-running commands.

use console::Term;
use tokio::sync::watch;

/// Shutdown signal shared by the daemon loop and anything it runs.
///
/// Created once by the command that needs it and passed down explicitly.
#[derive(Clone)]
pub(crate) struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Install the Ctrl+C handler.
    ///
    /// The first Ctrl+C requests a graceful stop; the second exits
    /// immediately.
    pub(crate) fn install() -> Self {
        let (tx, rx) = watch::channel(false);

        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to install Ctrl+C handler: {}", e);
                return;
            }

            let is_tty = Term::stdout().is_term();
            if is_tty {
                eprintln!("\n\nShutdown requested, finishing current operations...");
                eprintln!("Press Ctrl+C again to force quit.");
            } else {
                tracing::warn!("Shutdown requested, finishing current operations");
            }

            let _ = tx.send(true);

            if tokio::signal::ctrl_c().await.is_ok() {
                if is_tty {
                    eprintln!("Force quit!");
                }
                std::process::exit(130);
            }
        });

        Self { rx }
    }

    #[cfg(test)]
    fn from_receiver(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    pub(crate) fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested.
    pub(crate) async fn requested(&self) {
        let mut rx = self.rx.clone();
        // An error means the handler task is gone and no request can arrive.
        if rx.wait_for(|requested| *requested).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
