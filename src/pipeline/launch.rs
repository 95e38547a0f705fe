// src/pipeline/launch.rs

//! Bounded fan-out / unordered fan-in.
//!
//! [`launch_limited`] runs every task with at most `limit` of them in flight
//! and returns whatever the tasks emitted through their [`Sink`]. A task that
//! fails, panics, or simply chooses not to emit contributes nothing.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

/// A unit of work handed to [`launch_limited`].
pub type Task<T> = Box<dyn FnOnce(Sink<T>) -> BoxFuture<'static, ()> + Send>;

/// Output handle given to each task.
#[derive(Debug)]
pub struct Sink<T> {
    tx: mpsc::Sender<T>,
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Send> Sink<T> {
    /// Deliver one value to the collector.
    ///
    /// Returns `false` if the collector has gone away.
    pub async fn emit(&self, value: T) -> bool {
        self.tx.send(value).await.is_ok()
    }
}

/// Box a closure into a [`Task`].
pub fn task<T, F, Fut>(f: F) -> Task<T>
where
    T: Send + 'static,
    F: FnOnce(Sink<T>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move |sink| f(sink).boxed())
}

/// Run all `tasks`, at most `limit` concurrently, and collect what they emit.
///
/// The returned values are in no particular order. An empty task list or a
/// zero `limit` returns an empty collection without launching anything.
pub async fn launch_limited<T>(tasks: Vec<Task<T>>, limit: usize) -> Vec<T>
where
    T: Send + 'static,
{
    if tasks.is_empty() {
        return Vec::new();
    }
    if limit == 0 {
        log::warn!(
            "Refusing to launch {} tasks with a concurrency limit of 0",
            tasks.len()
        );
        return Vec::new();
    }

    // Sized to the task count so emitting never waits on the collector.
    let (tx, mut rx) = mpsc::channel(tasks.len());
    let mut values = Vec::with_capacity(tasks.len());
    tokio::spawn(manage_launch(tx, tasks, limit));

    while let Some(value) = rx.recv().await {
        values.push(value);
    }
    values
}

async fn manage_launch<T>(tx: mpsc::Sender<T>, tasks: Vec<Task<T>>, limit: usize)
where
    T: Send + 'static,
{
    let guard = Arc::new(Semaphore::new(limit));
    let mut running = JoinSet::new();

    for task in tasks {
        // The semaphore is never closed, so acquiring cannot fail.
        let Ok(permit) = Arc::clone(&guard).acquire_owned().await else {
            break;
        };
        let sink = Sink { tx: tx.clone() };
        running.spawn(async move {
            // Dropped on completion or unwind, returning the slot either way.
            let _permit = permit;
            task(sink).await;
        });
    }

    while let Some(joined) = running.join_next().await {
        if let Err(error) = joined {
            log::warn!("Launched task did not complete: {}", error);
        }
    }

    // Every task is done; closing the channel ends the collector's drain.
    drop(tx);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Tracks how many tasks run at once.
    #[derive(Default)]
    struct Gauge {
        active: AtomicUsize,
        peak: AtomicUsize,
        started: AtomicUsize,
    }

    impl Gauge {
        fn enter(&self) {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn leave(&self) {
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn gauged_tasks(gauge: &Arc<Gauge>, count: usize, limit: usize) -> Vec<Task<usize>> {
        (0..count)
            .map(|i| {
                let gauge = Arc::clone(gauge);
                task(move |sink: Sink<usize>| async move {
                    gauge.enter();
                    assert!(gauge.active.load(Ordering::SeqCst) <= limit);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    gauge.leave();
                    sink.emit(i).await;
                })
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_never_exceeds_limit() {
        for limit in [1, 3, 8] {
            let gauge = Arc::new(Gauge::default());
            let values = launch_limited(gauged_tasks(&gauge, 24, limit), limit).await;

            assert_eq!(values.len(), 24);
            let peak = gauge.peak.load(Ordering::SeqCst);
            assert!(peak >= 1 && peak <= limit, "peak {peak} over limit {limit}");
            assert_eq!(gauge.active.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_collects_only_emitted_values() {
        let tasks: Vec<Task<usize>> = (0..10)
            .map(|i| {
                task(move |sink: Sink<usize>| async move {
                    if i % 2 == 0 {
                        sink.emit(i).await;
                    }
                })
            })
            .collect();

        let mut values = launch_limited(tasks, 3).await;
        values.sort_unstable();
        assert_eq!(values, vec![0, 2, 4, 6, 8]);
    }

    #[tokio::test]
    async fn test_panicking_task_releases_its_slot() {
        let mut tasks: Vec<Task<&'static str>> = vec![task(|_sink: Sink<&'static str>| async {
            panic!("boom");
        })];
        tasks.extend((0..3).map(|_| {
            task(|sink: Sink<&'static str>| async move {
                sink.emit("ok").await;
            })
        }));

        let values = launch_limited(tasks, 1).await;
        assert_eq!(values, vec!["ok", "ok", "ok"]);
    }

    #[tokio::test]
    async fn test_empty_task_list() {
        let values: Vec<u8> = launch_limited(Vec::new(), 4).await;
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn test_zero_limit_launches_nothing() {
        let gauge = Arc::new(Gauge::default());
        let values = launch_limited(gauged_tasks(&gauge, 5, 1), 0).await;

        assert!(values.is_empty());
        assert_eq!(gauge.started.load(Ordering::SeqCst), 0);
    }
}
