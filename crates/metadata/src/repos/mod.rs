//! Repository traits for metadata operations.

pub mod updates;

pub use updates::{SortOrder, UpdateRepo};
