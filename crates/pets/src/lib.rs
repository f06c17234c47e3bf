//! Pets domain module.
//!
//! Plain data types and validation rules for pets, their category and tags
//! (no IO, no HTTP, no storage).

pub mod pet;

pub use pet::{Category, Pet, PetStatus, Tag};
