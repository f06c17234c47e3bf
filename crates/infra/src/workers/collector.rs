use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{BoxedJob, WorkerHandle};

/// Periodic producer: builds one job, enqueues it, sleeps `interval`, repeats.
///
/// Enqueueing waits while the queue is full. Stopping is observed before each
/// cycle, while waiting on the queue and while sleeping.
pub struct Collector<F> {
    name: &'static str,
    interval: Duration,
    jobs: mpsc::Sender<BoxedJob>,
    make_job: F,
}

impl<F> Collector<F>
where
    F: Fn() -> BoxedJob + Send + 'static,
{
    pub fn new(name: &'static str, interval: Duration, jobs: mpsc::Sender<BoxedJob>, make_job: F) -> Self {
        Self {
            name,
            interval,
            jobs,
            make_job,
        }
    }

    /// Spawn the produce loop and return immediately.
    pub fn start(self) -> WorkerHandle {
        let shutdown = CancellationToken::new();
        let name = self.name;
        let join = tokio::spawn(self.run(shutdown.clone()));
        WorkerHandle::new(name, shutdown, join)
    }

    async fn run(self, shutdown: CancellationToken) {
        let name = self.name;
        info!(runner = name, interval_ms = self.interval.as_millis() as u64, "collector started");

        while !shutdown.is_cancelled() {
            let job = (self.make_job)();
            info!(runner = name, job = job.name(), "collecting job");

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                sent = self.jobs.send(job) => {
                    if sent.is_err() {
                        info!(runner = name, "job queue closed");
                        break;
                    }
                }
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!(runner = name, "collector stopped");
    }
}
