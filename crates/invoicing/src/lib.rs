//! Invoicing domain module.
//!
//! Builds the periodic invoice report from a window of orders and renders it
//! to markdown. The archived `Invoice` record is what the repositories store.

pub mod invoice;
pub mod render;
pub mod report;

pub use invoice::Invoice;
pub use render::{InvoiceRenderer, InvoicingError};
pub use report::InvoiceReport;
