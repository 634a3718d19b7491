use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::kind::AvailabilityKind;
use crate::strategy::AvailabilityStrategy;

/// The item is either available or it isn't.
///
/// Only administration flips the flag; purchases never touch it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanAvailability {
    is_available: bool,
}

impl BooleanAvailability {
    pub fn new(is_available: bool) -> Self {
        Self { is_available }
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub(crate) fn set(&mut self, is_available: bool) {
        self.is_available = is_available;
    }
}

impl Default for BooleanAvailability {
    fn default() -> Self {
        Self { is_available: true }
    }
}

impl AvailabilityStrategy for BooleanAvailability {
    fn kind(&self) -> AvailabilityKind {
        AvailabilityKind::Boolean
    }

    fn available_on(&self, _today: NaiveDate) -> bool {
        self.is_available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn available_reports_the_flag_verbatim() {
        assert!(BooleanAvailability::new(true).available_on(day()));
        assert!(!BooleanAvailability::new(false).available_on(day()));
    }

    #[test]
    fn defaults_to_available() {
        assert!(BooleanAvailability::default().is_available());
    }

    #[test]
    fn quantity_is_not_tracked() {
        let off = BooleanAvailability::new(false);
        assert!(off.quantity_available(1));
        assert!(off.quantity_available(u32::MAX));
    }

    #[test]
    fn purchases_never_change_the_flag() {
        for flag in [true, false] {
            let mut policy = BooleanAvailability::new(flag);
            policy.record_purchase(1).unwrap();
            policy.record_purchase(1_000).unwrap();
            assert_eq!(policy.is_available(), flag);
        }
    }
}
