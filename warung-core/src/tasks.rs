//! Fire-and-forget background work
//!
//! Work spawned here never delays a response. Each task's error channel is
//! drained at the task boundary: failures are logged and dropped, panics are
//! reported when the handles are joined.

use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Handle for spawning detached background work
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `work` on the current runtime without waiting for it.
    ///
    /// Errors are logged under `name`. Outside a runtime the work is dropped
    /// with a warning; the caller is never affected.
    pub fn spawn<F>(&self, name: &'static str, work: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!("background task '{}' dropped: no async runtime", name);
                return;
            }
        };

        let handle = runtime.spawn(async move {
            if let Err(err) = work.await {
                log::warn!("background task '{}' failed: {:#}", name, err);
            }
        });

        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of tasks that have not finished yet
    pub fn pending(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every spawned task, including tasks spawned while waiting.
    /// Used on shutdown and in tests.
    pub async fn drain(&self) {
        loop {
            let batch: Vec<JoinHandle<()>> = {
                let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
                std::mem::take(&mut *handles)
            };
            if batch.is_empty() {
                break;
            }
            for handle in batch {
                if let Err(err) = handle.await {
                    log::error!("background task panicked: {}", err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn spawned_work_runs_and_errors_are_swallowed() {
        let tasks = BackgroundTasks::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let counter = ran.clone();
        tasks.spawn("ok", async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), anyhow::Error>(())
        });
        tasks.spawn("fails", async { Err::<(), _>(anyhow::anyhow!("upstream went away")) });

        tasks.drain().await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(tasks.pending(), 0);
    }

    #[test]
    fn spawn_outside_runtime_is_a_no_op() {
        let tasks = BackgroundTasks::new();
        tasks.spawn("orphan", async { Ok::<(), anyhow::Error>(()) });
        assert_eq!(tasks.pending(), 0);
    }
}
