//! Configuration hot reload.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::BreakerConfig;

/// The current configuration, shared across subsystems.
///
/// Readers take a cheap snapshot; a running incident keeps working from the
/// snapshot it took at trigger time, so a reload never changes a live
/// incident's behavior.
pub struct CurrentConfig {
    inner: ArcSwap<BreakerConfig>,
}

impl CurrentConfig {
    pub fn new(initial: BreakerConfig) -> Arc<Self> {
        Arc::new(Self {
            inner: ArcSwap::from_pointee(initial),
        })
    }

    /// Snapshot the configuration as of now.
    pub fn snapshot(&self) -> Arc<BreakerConfig> {
        self.inner.load_full()
    }

    /// Replace the configuration.
    pub fn apply(&self, next: BreakerConfig) {
        self.inner.store(Arc::new(next));
    }
}

/// Watch `path` and apply every successfully reloaded configuration to
/// `current`. A reload that fails to parse or validate is logged and the
/// running configuration stays in effect.
///
/// Must be called from within a tokio runtime. The returned watcher has to
/// stay alive for reloads to keep flowing; dropping it stops the watch.
pub fn watch_config(
    path: &Path,
    current: Arc<CurrentConfig>,
) -> Result<RecommendedWatcher, notify::Error> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let reload_path = path.to_path_buf();

    // notify invokes the handler on its own thread, so the reload is parsed
    // there and handed to the runtime over the channel.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(error = %e, "Config watch error");
                    return;
                }
            };
            if !event.kind.is_modify() && !event.kind.is_create() {
                return;
            }
            match load_config(&reload_path) {
                Ok(next) => {
                    let _ = tx.send(next);
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "Config reload rejected, keeping current configuration"
                    );
                }
            }
        },
        notify::Config::default().with_poll_interval(Duration::from_secs(2)),
    )?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    tracing::info!(path = ?path, "Watching configuration for changes");

    tokio::spawn(async move {
        while let Some(next) = rx.recv().await {
            tracing::info!("Applying reloaded configuration");
            current.apply(next);
        }
    });

    Ok(watcher)
}
