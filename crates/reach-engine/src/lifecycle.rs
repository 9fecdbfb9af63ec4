/// Boot and shutdown sequencing for the background task set.
///
/// `spawn_supervised` wraps a background task so a panic inside it is
/// logged instead of silently vanishing the way a bare `tokio::spawn`
/// would — the Checker, Scheduler, Dispatcher and config watcher are all
/// launched through it. `Lifecycle` owns the single stop signal every task
/// selects on, so one `shutdown()` call tears all of them down together.
use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::error;

pub struct Lifecycle {
    stop_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            stop_tx,
            handles: Vec::new(),
        }
    }

    pub fn stop_receiver(&self) -> watch::Receiver<bool> {
        self.stop_tx.subscribe()
    }

    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    /// Signals every task to stop and waits for them to finish.
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("background task did not shut down cleanly: {e}");
            }
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns `fut` as a background task, logging (rather than panicking the
/// whole process) if it unwinds.
pub fn spawn_supervised<F>(name: &'static str, fut: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = tokio::spawn(fut).await {
            error!("task '{name}' panicked: {e}");
        }
    })
}
