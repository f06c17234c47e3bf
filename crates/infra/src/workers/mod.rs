//! Background job execution.
//!
//! One [`Collector`] produces jobs on a fixed interval and one [`Worker`]
//! executes them, connected by a bounded queue. Both are tokio tasks stopped
//! through a [`WorkerHandle`].

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub mod collector;
pub mod dispatch;
pub mod invoice;
pub mod worker;

pub use collector::Collector;
pub use dispatch::{InvoiceDispatch, InvoiceWorkerConfig, WorkersConfig, dispatch_invoice_worker};
pub use invoice::{InvoiceJob, InvoiceJobError, InvoiceOutcome};
pub use worker::Worker;

/// A unit of background work. Runs to completion; failures are the job's
/// own business (log and return).
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self);
}

pub type BoxedJob = Box<dyn Job>;

/// Queue depth between collector and worker.
pub const QUEUE_CAPACITY: usize = 1;

pub fn job_queue() -> (mpsc::Sender<BoxedJob>, mpsc::Receiver<BoxedJob>) {
    mpsc::channel(QUEUE_CAPACITY)
}

/// Handle to stop and join a background task.
#[derive(Debug)]
pub struct WorkerHandle {
    name: &'static str,
    shutdown: CancellationToken,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    pub(crate) fn new(name: &'static str, shutdown: CancellationToken, join: JoinHandle<()>) -> Self {
        Self { name, shutdown, join }
    }

    /// Signal the task to stop. Never blocks; a job already running finishes first.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Request graceful shutdown and wait for the task to stop.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(err) = self.join.await {
            warn!(runner = self.name, error = %err, "background task ended abnormally");
        }
    }
}
