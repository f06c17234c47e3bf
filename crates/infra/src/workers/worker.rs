use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{BoxedJob, WorkerHandle};

/// Single consumer draining a job queue, one job at a time, in arrival order.
pub struct Worker {
    name: &'static str,
    jobs: mpsc::Receiver<BoxedJob>,
}

impl Worker {
    pub fn new(name: &'static str, jobs: mpsc::Receiver<BoxedJob>) -> Self {
        Self { name, jobs }
    }

    /// Spawn the consume loop and return immediately.
    pub fn start(self) -> WorkerHandle {
        let shutdown = CancellationToken::new();
        let name = self.name;
        let join = tokio::spawn(run(name, self.jobs, shutdown.clone()));
        WorkerHandle::new(name, shutdown, join)
    }
}

async fn run(name: &'static str, mut jobs: mpsc::Receiver<BoxedJob>, shutdown: CancellationToken) {
    info!(runner = name, "worker started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            job = jobs.recv() => match job {
                Some(job) => {
                    debug!(runner = name, job = job.name(), "executing job");
                    job.execute().await;
                }
                None => break,
            },
        }
    }

    info!(runner = name, "worker stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::workers::{Job, job_queue};

    struct RecordingJob {
        index: usize,
        seen: Arc<Mutex<Vec<usize>>>,
    }

    #[async_trait]
    impl Job for RecordingJob {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn execute(&self) {
            tokio::task::yield_now().await;
            self.seen.lock().unwrap().push(self.index);
        }
    }

    #[tokio::test]
    async fn executes_jobs_in_production_order() {
        let (tx, rx) = job_queue();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle = Worker::new("test-worker", rx).start();

        for index in 0..5 {
            tx.send(Box::new(RecordingJob { index, seen: seen.clone() })).await.unwrap();
        }
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), async {
            while !handle.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn stop_while_idle_returns_promptly() {
        let (_tx, rx) = job_queue();
        let handle = Worker::new("idle-worker", rx).start();

        tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .expect("idle worker did not stop");
    }
}
