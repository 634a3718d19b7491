//! Availability domain module.
//!
//! Decides whether a SKU can be bought, and how many units, through
//! interchangeable policies selected by a type code. Pure domain logic: no IO,
//! no storage, no logging.

pub mod availability;
pub mod boolean;
pub mod clock;
pub mod countdown;
pub mod date_range;
pub mod error;
pub mod kind;
pub mod policy;
pub mod strategy;

pub use availability::{
    Availability, AvailabilityCommand, AvailabilityEvent, FlagChanged, PurchaseRecorded,
    RecordPurchase, Restock, Restocked, SetAvailable, SetWindow, WindowChanged,
    AVAILABILITY_AGGREGATE_TYPE,
};
pub use boolean::BooleanAvailability;
pub use clock::{Clock, FixedClock, SystemClock};
pub use countdown::CountdownAvailability;
pub use date_range::DateRangeAvailability;
pub use error::{AvailabilityError, AvailabilityResult};
pub use kind::{AvailabilityKind, AvailabilityType, AvailabilityTypeRegistry, RegisteredType};
pub use policy::AvailabilityPolicy;
pub use strategy::AvailabilityStrategy;
