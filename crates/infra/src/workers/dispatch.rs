use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use petstore_invoicing::InvoiceRenderer;

use super::{BoxedJob, Collector, InvoiceJob, Worker, WorkerHandle, job_queue};
use crate::repository::{InvoiceRepository, OrderRepository};
use crate::storage::ObjectStorage;

#[derive(Debug, Clone, Deserialize)]
pub struct WorkersConfig {
    pub invoice: InvoiceWorkerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceWorkerConfig {
    /// Both the collection period and the order look-back window.
    #[serde(deserialize_with = "petstore_core::duration::deserialize_positive")]
    pub interval: Duration,
    /// Where scratch files for uploads are created.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Also store each rendered invoice in the `invoices` table.
    #[serde(default)]
    pub archive: bool,
    /// Template override; the built-in markdown template is used otherwise.
    #[serde(default)]
    pub template: Option<PathBuf>,
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("tmp")
}

/// Running invoice worker subsystem.
#[derive(Debug)]
pub struct InvoiceDispatch {
    worker: WorkerHandle,
    collector: WorkerHandle,
}

impl InvoiceDispatch {
    /// Signal both tasks without waiting.
    pub fn stop(&self) {
        self.collector.stop();
        self.worker.stop();
    }

    /// Stop the collector first so no new job is queued, then the worker.
    pub async fn shutdown(self) {
        self.collector.shutdown().await;
        self.worker.shutdown().await;
        info!("invoice worker stopped");
    }
}

/// Wire one worker to one invoice collector over a fresh queue and start both.
pub fn dispatch_invoice_worker(
    config: &InvoiceWorkerConfig,
    orders: Arc<dyn OrderRepository>,
    storage: Arc<dyn ObjectStorage>,
    renderer: Arc<InvoiceRenderer>,
    archive: Option<Arc<dyn InvoiceRepository>>,
) -> InvoiceDispatch {
    info!(interval_ms = config.interval.as_millis() as u64, "dispatch invoice worker");

    let mut prototype = InvoiceJob::new(orders, storage, renderer, config.interval, &config.temp_dir);
    if let Some(archive) = archive {
        prototype = prototype.with_archive(archive);
    }

    let (jobs_tx, jobs_rx) = job_queue();
    let worker = Worker::new("invoice-worker", jobs_rx).start();
    let collector = Collector::new("invoice-collector", config.interval, jobs_tx, move || {
        Box::new(prototype.clone()) as BoxedJob
    })
    .start();

    InvoiceDispatch { worker, collector }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use petstore_orders::{Order, OrderStatus};

    use super::*;
    use crate::repository::InMemoryOrders;
    use crate::storage::StorageError;

    #[derive(Default)]
    struct CountingStorage {
        saved: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStorage for CountingStorage {
        async fn save(&self, bucket: &str, filename: &str, _: &str, _: &Path) -> Result<(), StorageError> {
            self.saved.lock().unwrap().push(format!("{bucket}/{filename}"));
            Ok(())
        }

        async fn get_link(&self, bucket: &str, filename: &str) -> Result<String, StorageError> {
            Ok(format!("{bucket}/{filename}"))
        }

        async fn delete(&self, _: &str, _: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn config_parses_human_interval() {
        let cfg: WorkersConfig =
            serde_json::from_str(r#"{"invoice":{"interval":"1h","archive":true}}"#).unwrap();
        assert_eq!(cfg.invoice.interval, Duration::from_secs(3600));
        assert_eq!(cfg.invoice.temp_dir, PathBuf::from("tmp"));
        assert!(cfg.invoice.archive);
        assert!(cfg.invoice.template.is_none());
    }

    #[tokio::test]
    async fn dispatched_worker_uploads_invoices_until_shut_down() {
        let tmp = tempfile::tempdir().unwrap();
        let orders = Arc::new(InMemoryOrders::new());
        orders
            .create(Order::new(1, 2, OrderStatus::Placed, Utc::now()))
            .await
            .unwrap();
        let storage = Arc::new(CountingStorage::default());

        let config = InvoiceWorkerConfig {
            interval: Duration::from_secs(60),
            temp_dir: tmp.path().to_path_buf(),
            archive: false,
            template: None,
        };
        let dispatch = dispatch_invoice_worker(
            &config,
            orders,
            storage.clone(),
            Arc::new(InvoiceRenderer::new().unwrap()),
            None,
        );

        tokio::time::timeout(Duration::from_secs(5), async {
            while storage.saved.lock().unwrap().is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("no invoice uploaded");

        tokio::time::timeout(Duration::from_secs(1), dispatch.shutdown())
            .await
            .expect("dispatch did not shut down");

        let saved = storage.saved.lock().unwrap().clone();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].starts_with("invoices/invoice_"));
    }
}
