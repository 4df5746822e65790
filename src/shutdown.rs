/// Cooperative shutdown wiring.
///
/// A background task listens for SIGINT and SIGTERM and flips a watch
/// channel; the supervisor loop selects on [`ShutdownSignal::recv`].
/// Tests drive the same path through [`manual`].
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

/// Sending half used by [`manual`] to fire the signal by hand.
#[cfg(test)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

#[cfg(test)]
impl ShutdownHandle {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

/// Install SIGINT and SIGTERM handlers and return the receiving half.
///
/// The SIGTERM stream is registered here so a registration failure
/// surfaces before any child is spawned.
pub fn install() -> std::io::Result<ShutdownSignal> {
    let mut term = signal(SignalKind::terminate())?;
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "ctrl-c handler unavailable");
                std::future::pending::<()>().await;
            }
        };
        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("received SIGINT, shutting down");
            }
            _ = term.recv() => {
                tracing::info!("received SIGTERM, shutting down");
            }
        }
        let _ = tx.send(true);
    });
    Ok(ShutdownSignal { rx })
}

/// Channel pair with no signal hookup, for driving the shutdown path
/// by hand.
#[cfg(test)]
pub fn manual() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownSignal { rx })
}

impl ShutdownSignal {
    /// Resolve once shutdown has been requested. If the sending side is
    /// gone without ever firing, stay pending; the caller's other
    /// select arms keep running.
    pub async fn recv(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(test)]
    pub fn triggered(&self) -> bool {
        *self.rx.borrow()
    }
}
