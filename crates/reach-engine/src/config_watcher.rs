/// Hot-reload of the YAML config file.
///
/// Grounded on the reference engine's fsnotify watcher, translated to
/// `notify`'s recommended (platform-native) backend: a raw OS event stream
/// is forwarded into a debounced async loop so a text editor's
/// write-then-rename save sequence collapses into one reload instead of two
/// or three.
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use reach_core::config::Config;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches `config_path` and pushes freshly loaded, validated configs into
/// `tx` whenever the file changes. Runs until its receiver task (driven by
/// `stop_rx`) is dropped or signaled to stop; the `notify::Watcher` itself
/// is kept alive for the duration of this future.
pub async fn watch_config(
    config_path: PathBuf,
    tx: watch::Sender<Config>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel();

    let mut watcher = match notify::recommended_watcher(move |res: notify::Result<Event>| {
        if raw_tx.send(res).is_err() {
            debug!("config watcher channel closed");
        }
    }) {
        Ok(w) => w,
        Err(e) => {
            error!("failed to create config file watcher: {e}");
            return;
        }
    };

    let watch_target: &Path = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if let Err(e) = watcher.watch(watch_target, RecursiveMode::NonRecursive) {
        error!("failed to watch {}: {e}", watch_target.display());
        return;
    }

    let mut pending = false;
    loop {
        tokio::select! {
            event = raw_rx.recv() => {
                match event {
                    Some(Ok(event)) => {
                        if is_relevant(&event, &config_path) {
                            pending = true;
                        }
                    }
                    Some(Err(e)) => warn!("config file watcher error: {e}"),
                    None => return,
                }
            }
            _ = tokio::time::sleep(DEBOUNCE), if pending => {
                pending = false;
                reload(&config_path, &tx).await;
            }
            _ = stop_rx.changed() => {
                if *stop_rx.borrow() {
                    info!("stopping config file watcher");
                    return;
                }
            }
        }
    }
}

fn is_relevant(event: &Event, config_path: &Path) -> bool {
    if !matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    ) {
        return false;
    }
    event.paths.iter().any(|p| p == config_path)
}

async fn reload(config_path: &Path, tx: &watch::Sender<Config>) {
    let path = config_path.to_path_buf();
    let result = tokio::task::spawn_blocking(move || crate::config::load_config(&path)).await;
    match result {
        Ok(Ok(config)) => {
            info!("config file changed, reloaded successfully");
            if tx.send(config).is_err() {
                debug!("config reload receiver dropped");
            }
        }
        Ok(Err(e)) => warn!("error reloading configuration: {e}"),
        Err(e) => warn!("config reload task panicked: {e}"),
    }
}
