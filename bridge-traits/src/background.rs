//! Background Execution
//!
//! Provides a spawning abstraction for detached, fire-and-forget work such as
//! cache priming. Nothing awaits a detached task and its outcome is never
//! linked to the request that scheduled it.

use futures::future::BoxFuture;

/// A detached unit of work. Its output is discarded.
pub type BackgroundTask = BoxFuture<'static, ()>;

/// Task spawner trait
///
/// Abstracts how the host runs detached work:
/// - **Web**: `event.waitUntil` / `spawn_local`
/// - **Desktop**: Tokio runtime
/// - **Tests**: a queue that is drained explicitly
///
/// Implementations must not run the task inline on the caller's stack; the
/// caller returns its own result first.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::background::TaskSpawner;
///
/// fn warm(spawner: &dyn TaskSpawner) {
///     spawner.spawn_detached("warm", Box::pin(async move {
///         // best-effort work
///     }));
/// }
/// ```
pub trait TaskSpawner: Send + Sync {
    /// Schedule `task` to run in the background under a diagnostic `name`.
    fn spawn_detached(&self, name: &str, task: BackgroundTask);
}
