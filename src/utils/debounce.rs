// src/utils/debounce.rs

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{sync::Mutex, task::JoinHandle};

/// A completed job, tagged with the sequence number it was issued under.
#[derive(Debug, Clone)]
pub struct Tagged<T> {
    pub seq: u64,
    pub value: T,
}

/// Runs only the most recent of a burst of jobs, after a quiet period.
///
/// Scheduling a job aborts the previous job's timer if it has not fired yet.
/// A job that already started is left to finish, but its result is dropped
/// unless no newer job was scheduled in the meantime.
pub struct Debouncer<T> {
    delay: Duration,
    issued: Arc<AtomicU64>,
    timer: Mutex<Option<JoinHandle<()>>>,
    latest: Arc<Mutex<Option<Tagged<T>>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            issued: Arc::new(AtomicU64::new(0)),
            timer: Mutex::new(None),
            latest: Arc::new(Mutex::new(None)),
        }
    }

    /// Schedules `job` and returns its sequence number.
    pub async fn schedule<F, Fut>(&self, job: F) -> u64
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.delay;
        let issued = Arc::clone(&self.issued);
        let latest = Arc::clone(&self.latest);

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if issued.load(Ordering::SeqCst) != seq {
                return;
            }
            // Detached so that aborting this timer never cancels a dispatched job.
            tokio::spawn(async move {
                let value = job().await;
                if issued.load(Ordering::SeqCst) != seq {
                    tracing::debug!("Discarding stale result #{}", seq);
                    return;
                }
                *latest.lock().await = Some(Tagged { seq, value });
            });
        });

        if let Some(previous) = self.timer.lock().await.replace(timer) {
            previous.abort();
        }
        seq
    }

    /// Invalidates every outstanding job and forgets the last result.
    pub async fn reset(&self) {
        self.issued.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = self.timer.lock().await.take() {
            previous.abort();
        }
        *self.latest.lock().await = None;
    }

    /// Sequence number of the most recently scheduled job.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}

impl<T: Clone + Send + 'static> Debouncer<T> {
    /// The last stored result, if it belongs to the latest issued job.
    pub async fn latest(&self) -> Option<Tagged<T>> {
        let issued = self.issued();
        self.latest
            .lock()
            .await
            .as_ref()
            .filter(|tagged| tagged.seq == issued)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn only_the_last_input_runs() {
        let debouncer = Debouncer::new(Duration::from_millis(1000));
        let runs = Arc::new(AtomicUsize::new(0));

        for input in ["S", "SE", "SEL"] {
            let runs = Arc::clone(&runs);
            debouncer
                .schedule(move || async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    input.to_string()
                })
                .await;
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        let latest = debouncer.latest().await.unwrap();
        assert_eq!(latest.seq, 3);
        assert_eq!(latest.value, "SEL");
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_runs_before_the_delay() {
        let debouncer = Debouncer::new(Duration::from_millis(1000));
        debouncer.schedule(|| async { 1u32 }).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(debouncer.latest().await.is_none());
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(debouncer.latest().await.unwrap().value, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_stale_job_does_not_overwrite_newer_result() {
        let debouncer = Debouncer::new(Duration::from_millis(100));

        debouncer
            .schedule(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "stale"
            })
            .await;
        // Let the first job dispatch, then supersede it while it is in flight.
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.schedule(|| async { "fresh" }).await;

        tokio::time::sleep(Duration::from_secs(20)).await;

        let latest = debouncer.latest().await.unwrap();
        assert_eq!(latest.seq, 2);
        assert_eq!(latest.value, "fresh");
    }

    #[tokio::test(start_paused = true)]
    async fn reset_forgets_results() {
        let debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.schedule(|| async { 7u8 }).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(debouncer.latest().await.is_some());

        debouncer.reset().await;
        assert!(debouncer.latest().await.is_none());
    }
}
