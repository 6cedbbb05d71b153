//! Background Task Execution Implementation

use bridge_traits::background::{BackgroundTask, TaskSpawner};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Tokio-based spawner for detached work on desktop.
///
/// Tasks run on the runtime captured at construction (see
/// [`TokioTaskSpawner::with_handle`]) or, failing that, on whichever runtime
/// is current when the task is spawned. With no runtime available the task is
/// dropped and a warning is logged.
#[derive(Clone, Default)]
pub struct TokioTaskSpawner {
    handle: Option<Handle>,
    in_flight: Arc<AtomicUsize>,
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TokioTaskSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin every task to a specific runtime.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of spawned tasks that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn runtime(&self) -> Option<Handle> {
        self.handle.clone().or_else(|| Handle::try_current().ok())
    }
}

impl TaskSpawner for TokioTaskSpawner {
    fn spawn_detached(&self, name: &str, task: BackgroundTask) {
        let Some(runtime) = self.runtime() else {
            warn!(task = name, "No Tokio runtime available; dropping background task");
            return;
        };

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let name = name.to_string();

        debug!(task = %name, "Spawning background task");
        runtime.spawn(async move {
            let _guard = guard;
            task.await;
            debug!(task = %name, "Background task finished");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_spawned_task_runs() {
        let spawner = TokioTaskSpawner::new();
        let (tx, rx) = oneshot::channel();

        spawner.spawn_detached(
            "send",
            Box::pin(async move {
                let _ = tx.send(42);
            }),
        );

        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_in_flight_tracks_running_tasks() {
        let spawner = TokioTaskSpawner::new();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        spawner.spawn_detached(
            "wait",
            Box::pin(async move {
                let _ = release_rx.await;
            }),
        );
        assert_eq!(spawner.in_flight(), 1);

        release_tx.send(()).unwrap();
        for _ in 0..50 {
            if spawner.in_flight() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(spawner.in_flight(), 0);
    }

    #[test]
    fn test_without_runtime_task_is_dropped() {
        let spawner = TokioTaskSpawner::new();
        spawner.spawn_detached("orphan", Box::pin(async {}));
        assert_eq!(spawner.in_flight(), 0);
    }
}
