//! Infrastructure layer: Postgres, object storage and background workers.

pub mod db;
pub mod repository;
pub mod storage;
pub mod workers;
