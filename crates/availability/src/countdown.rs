use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AvailabilityError, AvailabilityResult};
use crate::kind::AvailabilityKind;
use crate::strategy::AvailabilityStrategy;

/// Each purchase draws down a stock counter until the item sells out.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CountdownAvailability {
    num_products: u32,
}

impl CountdownAvailability {
    pub fn new(num_products: u32) -> Self {
        Self { num_products }
    }

    pub fn num_products(&self) -> u32 {
        self.num_products
    }

    pub(crate) fn set_num_products(&mut self, num_products: u32) {
        self.num_products = num_products;
    }
}

impl AvailabilityStrategy for CountdownAvailability {
    fn kind(&self) -> AvailabilityKind {
        AvailabilityKind::Countdown
    }

    fn available_on(&self, _today: NaiveDate) -> bool {
        self.num_products > 0
    }

    fn quantity_available(&self, quantity: u32) -> bool {
        quantity <= self.num_products
    }

    fn record_purchase(&mut self, quantity: u32) -> AvailabilityResult<()> {
        if quantity > self.num_products {
            return Err(AvailabilityError::QuantityExceedsAvailable {
                requested: quantity,
                available: self.num_products,
            });
        }

        // Never binding after the guard above; keeps the counter non-negative
        // if the guard is ever relaxed.
        self.num_products = self.num_products.saturating_sub(quantity);
        Ok(())
    }
}
