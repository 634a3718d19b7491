//! Projections (read model builders).
//!
//! Projections consume published envelopes and keep query-friendly views.
//! They are rebuildable from the event stream and idempotent under
//! at-least-once delivery.

pub mod sku_availability;

pub use sku_availability::{SkuAvailabilityProjection, SkuAvailabilityView};
