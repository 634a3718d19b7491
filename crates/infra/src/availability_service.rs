//! Command execution for availabilities.
//!
//! ```text
//! Command
//!   ↓
//! 1. Lock the availability (store, per id)
//!   ↓
//! 2. Decide + apply (pure, in the aggregate)
//!   ↓
//! 3. Persist the new state, release the lock
//!   ↓
//! 4. Publish the committed events to the bus
//! ```
//!
//! Business rejections (`QuantityExceedsAvailable`) and integrity failures
//! are returned to the caller unchanged; nothing is retried here.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use tracing::{error, info, warn};
use uuid::Uuid;

use shelfkit_availability::{
    Availability, AvailabilityCommand, AvailabilityPolicy, Clock, RecordPurchase, Restock,
    SetAvailable, SetWindow, SystemClock, AVAILABILITY_AGGREGATE_TYPE,
};
use shelfkit_catalog::Sku;
use shelfkit_core::{AggregateRoot, AvailabilityId, ExpectedVersion};
use shelfkit_events::{Event, EventBus, EventEnvelope};

use crate::store::{AvailabilityStore, Committed, StoreError};

/// Front door for reading and changing availabilities.
///
/// - `S`: where availabilities live (`InMemoryAvailabilityStore` in tests)
/// - `B`: where committed events go
/// - `C`: the source of "today" for date-window checks
#[derive(Debug)]
pub struct AvailabilityService<S, B, C = SystemClock> {
    store: S,
    bus: B,
    clock: C,
}

impl<S, B> AvailabilityService<S, B, SystemClock> {
    pub fn new(store: S, bus: B) -> Self {
        Self::with_clock(store, bus, SystemClock)
    }
}

impl<S, B, C> AvailabilityService<S, B, C> {
    pub fn with_clock(store: S, bus: B, clock: C) -> Self {
        Self { store, bus, clock }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<S, B, C> AvailabilityService<S, B, C>
where
    S: AvailabilityStore,
    B: EventBus<EventEnvelope<JsonValue>>,
    C: Clock,
{
    /// Create and store an availability of type `code`.
    ///
    /// Without an explicit policy the variant's default is used (available,
    /// zero stock, unbounded window).
    pub fn create(
        &self,
        code: &str,
        policy: Option<AvailabilityPolicy>,
    ) -> Result<Availability, StoreError> {
        let registry = self.store.registry();
        let id = AvailabilityId::new();
        let availability = match policy {
            Some(policy) => registry.create_with(id, code, policy)?,
            None => registry.create(id, code)?,
        };

        self.store.insert(&availability)?;
        info!(availability_id = %id, type_code = code, "availability created");
        Ok(availability)
    }

    pub fn get(&self, id: AvailabilityId) -> Result<Availability, StoreError> {
        self.store.load(id).inspect_err(|err| log_integrity(id, err))
    }

    /// Whether the item can be bought today, per the configured clock.
    pub fn available(&self, id: AvailabilityId) -> Result<bool, StoreError> {
        Ok(self.get(id)?.available_on(self.clock.today()))
    }

    pub fn quantity_available(&self, id: AvailabilityId, quantity: u32) -> Result<bool, StoreError> {
        Ok(self.get(id)?.quantity_available(quantity))
    }

    /// `available` and `quantity_available`, read from one snapshot.
    pub fn is_purchasable(&self, id: AvailabilityId, quantity: u32) -> Result<bool, StoreError> {
        let availability = self.get(id)?;
        Ok(availability.available_on(self.clock.today()) && availability.quantity_available(quantity))
    }

    /// Record a purchase, returning the state after it was applied.
    ///
    /// Serialized against every other command on `id`, so concurrent
    /// purchases can never drive a countdown below zero.
    pub fn record_purchase(&self, id: AvailabilityId, quantity: u32) -> Result<Availability, StoreError> {
        let command = AvailabilityCommand::RecordPurchase(RecordPurchase {
            availability_id: id,
            quantity,
            occurred_at: now(),
        });
        Ok(self.dispatch(id, &command, ExpectedVersion::Any)?.availability)
    }

    pub fn set_available(&self, id: AvailabilityId, is_available: bool) -> Result<Availability, StoreError> {
        let command = AvailabilityCommand::SetAvailable(SetAvailable {
            availability_id: id,
            is_available,
            occurred_at: now(),
        });
        Ok(self.dispatch(id, &command, ExpectedVersion::Any)?.availability)
    }

    pub fn restock(&self, id: AvailabilityId, quantity: u32) -> Result<Availability, StoreError> {
        let command = AvailabilityCommand::Restock(Restock {
            availability_id: id,
            quantity,
            occurred_at: now(),
        });
        Ok(self.dispatch(id, &command, ExpectedVersion::Any)?.availability)
    }

    pub fn set_window(
        &self,
        id: AvailabilityId,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Availability, StoreError> {
        let command = AvailabilityCommand::SetWindow(SetWindow {
            availability_id: id,
            start_date,
            end_date,
            occurred_at: now(),
        });
        Ok(self.dispatch(id, &command, ExpectedVersion::Any)?.availability)
    }

    /// Whether `quantity` units of `sku` can be bought today.
    pub fn sku_purchasable(&self, sku: &Sku, quantity: u32) -> Result<bool, StoreError> {
        self.is_purchasable(sku.availability_id(), quantity)
    }

    /// Record a purchase against the availability backing `sku`.
    pub fn purchase_sku(&self, sku: &Sku, quantity: u32) -> Result<Availability, StoreError> {
        self.record_purchase(sku.availability_id(), quantity)
    }

    /// Run a command through the store and publish what it committed.
    ///
    /// Publication happens after the new state is persisted but before the
    /// store releases the availability, so envelopes for one id reach the bus
    /// in sequence order. If publication fails the state change stands and
    /// `Publish` is returned.
    pub fn dispatch(
        &self,
        id: AvailabilityId,
        command: &AvailabilityCommand,
        expected_version: ExpectedVersion,
    ) -> Result<Committed, StoreError> {
        let result = self
            .store
            .execute_with(id, command, expected_version, &mut |committed: &Committed| self.publish(committed));

        let committed = match result {
            Ok(committed) => committed,
            Err(err) => {
                if err.is_quantity_exceeded() {
                    warn!(availability_id = %id, command = command.name(), error = %err, "purchase rejected");
                }
                if let StoreError::Publish(msg) = &err {
                    error!(availability_id = %id, command = command.name(), error = %msg, "committed change was not published");
                }
                log_integrity(id, &err);
                return Err(err);
            }
        };

        if !committed.events.is_empty() {
            info!(
                availability_id = %id,
                command = command.name(),
                version = committed.availability.version(),
                remaining = ?committed.availability.policy().remaining(),
                "availability command committed"
            );
        }

        Ok(committed)
    }

    fn publish(&self, committed: &Committed) -> Result<(), StoreError> {
        for envelope in envelopes(committed)? {
            self.bus
                .publish(envelope)
                .map_err(|e| StoreError::Publish(format!("{e:?}")))?;
        }
        Ok(())
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

fn log_integrity(id: AvailabilityId, err: &StoreError) {
    if let StoreError::Integrity(msg) = err {
        error!(availability_id = %id, error = %msg, "availability record failed integrity check");
    }
}

/// Wrap committed events; the last one carries the aggregate's new version.
fn envelopes(committed: &Committed) -> Result<Vec<EventEnvelope<JsonValue>>, StoreError> {
    let version = committed.availability.version();
    let first = version + 1 - committed.events.len() as u64;
    let aggregate_id = *committed.availability.id_typed().as_uuid();

    committed
        .events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let payload = serde_json::to_value(event)
                .map_err(|e| StoreError::Publish(format!("serialize {}: {e}", event.event_type())))?;
            Ok(EventEnvelope::new(
                Uuid::now_v7(),
                aggregate_id,
                AVAILABILITY_AGGREGATE_TYPE,
                first + i as u64,
                event.event_type(),
                payload,
            ))
        })
        .collect()
}
