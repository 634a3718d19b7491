use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shelfkit_core::{DomainError, DomainResult};

use crate::kind::AvailabilityKind;
use crate::strategy::AvailabilityStrategy;

/// The item can be bought between two optional, inclusive dates.
///
/// A missing bound removes the restriction on that side. Quantities are not
/// tracked.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRangeAvailability {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl DateRangeAvailability {
    pub fn new(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> DomainResult<Self> {
        let window = Self {
            start_date,
            end_date,
        };
        window.validate()?;
        Ok(window)
    }

    /// No bounds: always available.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub(crate) fn set_bounds(&mut self, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) {
        self.start_date = start_date;
        self.end_date = end_date;
    }

    /// Reject windows that end before they start.
    pub fn validate(&self) -> DomainResult<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(DomainError::validation(format!(
                    "date window starts ({start}) after it ends ({end})"
                )));
            }
        }
        Ok(())
    }
}

impl AvailabilityStrategy for DateRangeAvailability {
    fn kind(&self) -> AvailabilityKind {
        AvailabilityKind::DateRange
    }

    fn available_on(&self, today: NaiveDate) -> bool {
        if self.start_date.is_some_and(|start| today < start) {
            return false; // too early
        }
        if self.end_date.is_some_and(|end| today > end) {
            return false; // too late
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn no_bounds_is_always_available() {
        let window = DateRangeAvailability::unbounded();
        assert!(window.available_on(d(1999, 1, 1)));
        assert!(window.available_on(d(2999, 12, 31)));
    }

    #[test]
    fn only_start_rejects_earlier_days() {
        let window = DateRangeAvailability::new(Some(d(2024, 3, 1)), None).unwrap();
        assert!(!window.available_on(d(2024, 2, 29)));
        assert!(window.available_on(d(2024, 3, 1)));
        assert!(window.available_on(d(2030, 1, 1)));
    }

    #[test]
    fn only_end_rejects_later_days() {
        let window = DateRangeAvailability::new(None, Some(d(2024, 3, 1))).unwrap();
        assert!(window.available_on(d(2000, 1, 1)));
        assert!(window.available_on(d(2024, 3, 1)));
        assert!(!window.available_on(d(2024, 3, 2)));
    }

    #[test]
    fn both_bounds_accept_days_inside_the_window() {
        let window = DateRangeAvailability::new(Some(d(2024, 1, 1)), Some(d(2024, 12, 31))).unwrap();
        assert!(window.available_on(d(2024, 1, 1)));
        assert!(window.available_on(d(2024, 7, 15)));
        assert!(window.available_on(d(2024, 12, 31)));
    }

    #[test]
    fn new_year_after_the_window_is_unavailable() {
        let window = DateRangeAvailability::new(Some(d(2024, 1, 1)), Some(d(2024, 12, 31))).unwrap();
        assert!(!window.available_on(d(2025, 1, 1)));
    }

    #[test]
    fn single_day_window_is_valid() {
        let window = DateRangeAvailability::new(Some(d(2024, 5, 5)), Some(d(2024, 5, 5))).unwrap();
        assert!(window.available_on(d(2024, 5, 5)));
        assert!(!window.available_on(d(2024, 5, 6)));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = DateRangeAvailability::new(Some(d(2024, 5, 6)), Some(d(2024, 5, 5))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn purchases_are_not_tracked() {
        let mut window = DateRangeAvailability::new(None, Some(d(2024, 1, 1))).unwrap();
        assert!(window.quantity_available(500));
        window.record_purchase(500).unwrap();
        assert_eq!(window.end_date(), Some(d(2024, 1, 1)));
    }
}
