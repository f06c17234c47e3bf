//! Store orders domain module.
//!
//! Order data, its wire format for ship dates and validation rules
//! (no IO, no HTTP, no storage).

pub mod order;
pub mod ship_date;

pub use order::{Order, OrderStatus, total_quantity};
