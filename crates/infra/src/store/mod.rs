//! Availability persistence boundary.
//!
//! Stores hold availability records and serialize every change per
//! availability id, so concurrent purchases of one SKU cannot lose updates or
//! overdraw stock.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryAvailabilityStore;
pub use r#trait::{AvailabilityRecord, AvailabilityStore, Committed, StoreError};
