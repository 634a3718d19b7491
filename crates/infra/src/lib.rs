//! Infrastructure layer: availability storage, the service that drives
//! commands through it, read models, and configuration.

pub mod availability_service;
pub mod config;
pub mod projections;
pub mod read_model;
pub mod store;
pub mod workers;


pub use availability_service::AvailabilityService;
pub use config::{ConfigError, InfraConfig};
pub use store::{AvailabilityRecord, AvailabilityStore, Committed, InMemoryAvailabilityStore, StoreError};
