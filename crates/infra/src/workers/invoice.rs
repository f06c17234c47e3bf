//! Periodic invoice generation.
//!
//! Each run collects the orders shipped within the last `interval`, renders
//! them to markdown, and uploads the document to the `invoices` bucket via a
//! scoped temporary file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use petstore_invoicing::{Invoice, InvoiceRenderer, InvoiceReport, InvoicingError};

use super::Job;
use crate::repository::{InvoiceRepository, OrderRepository, RepoError};
use crate::storage::{INVOICES_BUCKET, ObjectStorage, StorageError};

pub const INVOICE_CONTENT_TYPE: &str = "text/markdown; charset=UTF-8";

#[derive(Debug, Error)]
pub enum InvoiceJobError {
    #[error("interval out of range")]
    Interval,
    #[error("order lookup failed: {0}")]
    Orders(#[source] RepoError),
    #[error("render failed: {0}")]
    Render(#[from] InvoicingError),
    #[error("temp file failed: {0}")]
    TempFile(#[from] std::io::Error),
    #[error("upload failed: {0}")]
    Upload(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceOutcome {
    /// No orders shipped in the window.
    Skipped,
    Uploaded {
        filename: String,
        orders: usize,
        total_quantity: i64,
    },
}

#[derive(Clone)]
pub struct InvoiceJob {
    orders: Arc<dyn OrderRepository>,
    storage: Arc<dyn ObjectStorage>,
    renderer: Arc<InvoiceRenderer>,
    archive: Option<Arc<dyn InvoiceRepository>>,
    interval: Duration,
    temp_dir: PathBuf,
}

impl InvoiceJob {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        storage: Arc<dyn ObjectStorage>,
        renderer: Arc<InvoiceRenderer>,
        interval: Duration,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            orders,
            storage,
            renderer,
            archive: None,
            interval,
            temp_dir: temp_dir.into(),
        }
    }

    /// Also keep each rendered invoice in `archive`.
    pub fn with_archive(mut self, archive: Arc<dyn InvoiceRepository>) -> Self {
        self.archive = Some(archive);
        self
    }

    /// One invoice cycle as of `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<InvoiceOutcome, InvoiceJobError> {
        let window = TimeDelta::from_std(self.interval).map_err(|_| InvoiceJobError::Interval)?;
        let bound = now - window;

        let orders = match self.orders.shipped_after(bound).await {
            Ok(orders) => orders,
            Err(err) if err.is_not_found() => Vec::new(),
            Err(err) => return Err(InvoiceJobError::Orders(err)),
        };
        if orders.is_empty() {
            info!(since = %bound, "skipping invoice: no orders for that period");
            return Ok(InvoiceOutcome::Skipped);
        }

        let report = InvoiceReport::new(orders, now);
        let body = self.renderer.render(&report)?;
        let filename = report.filename();

        if let Some(archive) = &self.archive {
            if let Err(err) = archive.create(Invoice::new(body.clone(), now)).await {
                warn!(error = %err, "failed to archive invoice");
            }
        }

        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let temp = tempfile::Builder::new()
            .prefix("invoice_")
            .suffix(".md")
            .tempfile_in(&self.temp_dir)?;

        let uploaded = match tokio::fs::write(temp.path(), &body).await {
            Ok(()) => self
                .storage
                .save(INVOICES_BUCKET, &filename, INVOICE_CONTENT_TYPE, temp.path())
                .await
                .map_err(InvoiceJobError::from),
            Err(err) => Err(InvoiceJobError::from(err)),
        };

        let temp_path = temp.path().to_path_buf();
        if let Err(err) = temp.close() {
            error!(path = %temp_path.display(), error = %err, "unable to remove temp invoice file");
        }

        uploaded?;
        Ok(InvoiceOutcome::Uploaded {
            filename,
            orders: report.orders.len(),
            total_quantity: report.total_quantity,
        })
    }
}

#[async_trait]
impl Job for InvoiceJob {
    fn name(&self) -> &'static str {
        "invoice"
    }

    async fn execute(&self) {
        info!("invoice job start");
        match self.run_at(Utc::now()).await {
            Ok(InvoiceOutcome::Skipped) => {}
            Ok(InvoiceOutcome::Uploaded {
                filename,
                orders,
                total_quantity,
            }) => info!(%filename, orders, total_quantity, "invoice job finished"),
            Err(err) => error!(error = %err, "invoice job failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use petstore_orders::{Order, OrderStatus};

    use super::*;
    use crate::repository::{InMemoryInvoices, InMemoryOrders};

    #[derive(Debug, Clone)]
    struct Upload {
        bucket: String,
        filename: String,
        content_type: String,
        body: String,
    }

    /// Captures uploads (reading the source file at save time), optionally failing.
    #[derive(Default)]
    struct RecordingStorage {
        uploads: Mutex<Vec<Upload>>,
        fail: bool,
    }

    impl RecordingStorage {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn uploads(&self) -> Vec<Upload> {
            self.uploads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectStorage for RecordingStorage {
        async fn save(
            &self,
            bucket: &str,
            filename: &str,
            content_type: &str,
            source: &Path,
        ) -> Result<(), StorageError> {
            let body = tokio::fs::read_to_string(source).await?;
            if self.fail {
                return Err(StorageError::Status {
                    status: 503,
                    bucket: bucket.into(),
                    filename: filename.into(),
                });
            }
            self.uploads.lock().unwrap().push(Upload {
                bucket: bucket.into(),
                filename: filename.into(),
                content_type: content_type.into(),
                body,
            });
            Ok(())
        }

        async fn get_link(&self, bucket: &str, filename: &str) -> Result<String, StorageError> {
            Ok(format!("mem://{bucket}/{filename}"))
        }

        async fn delete(&self, _bucket: &str, _filename: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    async fn orders_shipped(now: DateTime<Utc>, shipped: &[(i64, i32)]) -> Arc<InMemoryOrders> {
        let repo = Arc::new(InMemoryOrders::new());
        for (minutes_ago, quantity) in shipped {
            repo.create(Order::new(
                1,
                *quantity,
                OrderStatus::Placed,
                now - TimeDelta::minutes(*minutes_ago),
            ))
            .await
            .unwrap();
        }
        repo
    }

    fn test_job(
        orders: Arc<InMemoryOrders>,
        storage: Arc<RecordingStorage>,
        renderer: InvoiceRenderer,
        temp_dir: &Path,
    ) -> InvoiceJob {
        InvoiceJob::new(orders, storage, Arc::new(renderer), Duration::from_secs(3600), temp_dir)
    }

    fn summary_renderer() -> InvoiceRenderer {
        InvoiceRenderer::from_source("{{ orders | length }}|{{ totalQuantity }}").unwrap()
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(true)
    }

    #[tokio::test]
    async fn only_orders_inside_the_window_are_invoiced() {
        let now = Utc::now();
        let tmp = tempfile::tempdir().unwrap();
        let storage = Arc::new(RecordingStorage::default());
        let orders = orders_shipped(now, &[(120, 7), (61, 4), (59, 2), (1, 1)]).await;

        let outcome = test_job(orders, storage.clone(), summary_renderer(), tmp.path())
            .run_at(now)
            .await
            .unwrap();

        assert!(matches!(outcome, InvoiceOutcome::Uploaded { orders: 2, total_quantity: 3, .. }));
        assert_eq!(storage.uploads()[0].body, "2|3");
    }

    #[tokio::test]
    async fn empty_window_uploads_nothing_and_leaves_no_temp_file() {
        let now = Utc::now();
        let tmp = tempfile::tempdir().unwrap();
        let storage = Arc::new(RecordingStorage::default());
        let orders = orders_shipped(now, &[(90, 3)]).await;

        let outcome = test_job(orders, storage.clone(), summary_renderer(), tmp.path())
            .run_at(now)
            .await
            .unwrap();

        assert_eq!(outcome, InvoiceOutcome::Skipped);
        assert!(storage.uploads().is_empty());
        assert!(dir_is_empty(tmp.path()));
    }

    #[tokio::test]
    async fn temp_file_is_removed_when_upload_fails() {
        let now = Utc::now();
        let tmp = tempfile::tempdir().unwrap();
        let storage = Arc::new(RecordingStorage::failing());
        let orders = orders_shipped(now, &[(5, 3)]).await;

        let res = test_job(orders, storage, summary_renderer(), tmp.path())
            .run_at(now)
            .await;

        assert!(matches!(res, Err(InvoiceJobError::Upload(_))));
        assert!(dir_is_empty(tmp.path()));
    }

    #[tokio::test]
    async fn temp_file_is_removed_after_successful_upload() {
        let now = Utc::now();
        let tmp = tempfile::tempdir().unwrap();
        let storage = Arc::new(RecordingStorage::default());
        let orders = orders_shipped(now, &[(5, 3)]).await;

        test_job(orders, storage.clone(), summary_renderer(), tmp.path())
            .run_at(now)
            .await
            .unwrap();

        assert_eq!(storage.uploads().len(), 1);
        assert!(dir_is_empty(tmp.path()));
    }

    #[tokio::test]
    async fn hourly_invoice_end_to_end() {
        let now = Utc::now();
        let tmp = tempfile::tempdir().unwrap();
        let storage = Arc::new(RecordingStorage::default());
        let orders = orders_shipped(now, &[(10, 3), (40, 5)]).await;

        test_job(orders, storage.clone(), InvoiceRenderer::new().unwrap(), tmp.path())
            .run_at(now)
            .await
            .unwrap();

        let uploads = storage.uploads();
        assert_eq!(uploads.len(), 1);
        let upload = &uploads[0];
        assert_eq!(upload.bucket, "invoices");
        assert_eq!(upload.content_type, INVOICE_CONTENT_TYPE);
        assert!(upload.filename.starts_with("invoice_"));
        assert!(upload.filename.contains(&now.format("%Y-%m-%d").to_string()));
        assert!(upload.body.contains("**Orders:** 2"));
        assert!(upload.body.contains("**Total quantity:** 8"));
    }

    #[tokio::test]
    async fn archive_keeps_the_rendered_body() {
        let now = Utc::now();
        let tmp = tempfile::tempdir().unwrap();
        let storage = Arc::new(RecordingStorage::default());
        let archive = Arc::new(InMemoryInvoices::new());
        let orders = orders_shipped(now, &[(10, 3)]).await;

        test_job(orders, storage, summary_renderer(), tmp.path())
            .with_archive(archive.clone())
            .run_at(now)
            .await
            .unwrap();

        assert_eq!(archive.newest().unwrap().body, "1|3");
    }
}
