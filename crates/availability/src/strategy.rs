use chrono::NaiveDate;

use crate::clock::{Clock, SystemClock};
use crate::error::AvailabilityResult;
use crate::kind::AvailabilityKind;

/// Capability every availability policy provides.
///
/// Policies that do not track quantities keep the default
/// `quantity_available` (always true) and `record_purchase` (no-op).
pub trait AvailabilityStrategy {
    /// Which variant this policy is.
    fn kind(&self) -> AvailabilityKind;

    /// Whether the item can be bought on `today`.
    fn available_on(&self, today: NaiveDate) -> bool;

    /// Whether the item can be bought today (local date).
    fn available(&self) -> bool {
        self.available_on(SystemClock.today())
    }

    /// Whether `quantity` units can be bought.
    fn quantity_available(&self, _quantity: u32) -> bool {
        true
    }

    /// Record a purchase of `quantity` units.
    ///
    /// Fails with `QuantityExceedsAvailable` without mutating anything when the
    /// purchase would overdraw.
    fn record_purchase(&mut self, _quantity: u32) -> AvailabilityResult<()> {
        Ok(())
    }
}
