//! `petstore-core`: shared domain building blocks.
//!
//! The error type for rejected input and human-readable durations for config.

pub mod duration;
pub mod error;

pub use error::{DomainError, DomainResult};
