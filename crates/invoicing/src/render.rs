use std::path::Path;

use tera::{Context, Tera};
use thiserror::Error;

use crate::report::InvoiceReport;

const TEMPLATE_NAME: &str = "invoice.md";
const DEFAULT_TEMPLATE: &str = include_str!("../templates/invoice.md");

#[derive(Debug, Error)]
pub enum InvoicingError {
    #[error("failed to read invoice template: {0}")]
    Io(#[from] std::io::Error),
    #[error("invoice template error: {0}")]
    Template(#[from] tera::Error),
}

/// Renders `InvoiceReport`s with a tera template.
#[derive(Debug, Clone)]
pub struct InvoiceRenderer {
    tera: Tera,
}

impl InvoiceRenderer {
    /// Renderer using the built-in markdown template.
    pub fn new() -> Result<Self, InvoicingError> {
        Self::from_source(DEFAULT_TEMPLATE)
    }

    /// Renderer using a template file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InvoicingError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_source(&source)
    }

    pub fn from_source(source: &str) -> Result<Self, InvoicingError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, source)?;
        Ok(Self { tera })
    }

    pub fn render(&self, report: &InvoiceReport) -> Result<String, InvoicingError> {
        let context = Context::from_serialize(report)?;
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}
