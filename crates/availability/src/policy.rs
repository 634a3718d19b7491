use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::boolean::BooleanAvailability;
use crate::countdown::CountdownAvailability;
use crate::date_range::DateRangeAvailability;
use crate::error::AvailabilityResult;
use crate::kind::AvailabilityKind;
use crate::strategy::AvailabilityStrategy;

/// Exactly one policy, owned by its availability.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AvailabilityPolicy {
    Boolean(BooleanAvailability),
    Countdown(CountdownAvailability),
    DateRange(DateRangeAvailability),
}

impl AvailabilityPolicy {
    /// Units left, for policies that track them.
    pub fn remaining(&self) -> Option<u32> {
        match self {
            AvailabilityPolicy::Countdown(c) => Some(c.num_products()),
            _ => None,
        }
    }

    fn strategy(&self) -> &dyn AvailabilityStrategy {
        match self {
            AvailabilityPolicy::Boolean(p) => p,
            AvailabilityPolicy::Countdown(p) => p,
            AvailabilityPolicy::DateRange(p) => p,
        }
    }

    fn strategy_mut(&mut self) -> &mut dyn AvailabilityStrategy {
        match self {
            AvailabilityPolicy::Boolean(p) => p,
            AvailabilityPolicy::Countdown(p) => p,
            AvailabilityPolicy::DateRange(p) => p,
        }
    }
}

impl AvailabilityStrategy for AvailabilityPolicy {
    fn kind(&self) -> AvailabilityKind {
        self.strategy().kind()
    }

    fn available_on(&self, today: NaiveDate) -> bool {
        self.strategy().available_on(today)
    }

    fn quantity_available(&self, quantity: u32) -> bool {
        self.strategy().quantity_available(quantity)
    }

    fn record_purchase(&mut self, quantity: u32) -> AvailabilityResult<()> {
        self.strategy_mut().record_purchase(quantity)
    }
}

impl From<BooleanAvailability> for AvailabilityPolicy {
    fn from(value: BooleanAvailability) -> Self {
        AvailabilityPolicy::Boolean(value)
    }
}

impl From<CountdownAvailability> for AvailabilityPolicy {
    fn from(value: CountdownAvailability) -> Self {
        AvailabilityPolicy::Countdown(value)
    }
}

impl From<DateRangeAvailability> for AvailabilityPolicy {
    fn from(value: DateRangeAvailability) -> Self {
        AvailabilityPolicy::DateRange(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_to_the_wrapped_variant() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let mut countdown = AvailabilityPolicy::from(CountdownAvailability::new(2));
        assert_eq!(countdown.kind(), AvailabilityKind::Countdown);
        assert!(countdown.available_on(today));
        assert!(!countdown.quantity_available(3));
        countdown.record_purchase(2).unwrap();
        assert_eq!(countdown.remaining(), Some(0));

        let flag = AvailabilityPolicy::from(BooleanAvailability::new(false));
        assert_eq!(flag.kind(), AvailabilityKind::Boolean);
        assert!(!flag.available_on(today));
        assert_eq!(flag.remaining(), None);
    }

    #[test]
    fn serializes_with_a_kind_tag() {
        let policy = AvailabilityPolicy::from(CountdownAvailability::new(9));
        let json = serde_json::to_value(policy).unwrap();
        assert_eq!(json["kind"], "countdown");
        assert_eq!(json["num_products"], 9);

        let back: AvailabilityPolicy = serde_json::from_value(json).unwrap();
        assert_eq!(back, policy);
    }
}
