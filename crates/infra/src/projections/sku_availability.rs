use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Context};
use serde_json::Value as JsonValue;
use tracing::warn;

use shelfkit_availability::{AvailabilityEvent, AVAILABILITY_AGGREGATE_TYPE};
use shelfkit_core::AvailabilityId;
use shelfkit_events::EventEnvelope;

use crate::read_model::ReadStore;

/// Sales view of one availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuAvailabilityView {
    pub availability_id: AvailabilityId,
    /// Number of purchases recorded.
    pub purchases: u64,
    /// Total units across those purchases.
    pub units_sold: u64,
    /// Stock left, for countdown policies.
    pub remaining: Option<u32>,
    pub last_sequence: u64,
    /// Sequence numbers skipped over because they never arrived.
    pub missed_events: u64,
}

impl SkuAvailabilityView {
    fn empty(availability_id: AvailabilityId) -> Self {
        Self {
            availability_id,
            purchases: 0,
            units_sold: 0,
            remaining: None,
            last_sequence: 0,
            missed_events: 0,
        }
    }
}

/// Builds `SkuAvailabilityView`s from availability envelopes.
///
/// Envelopes for other aggregate types are skipped. Replays at or below the
/// per-stream cursor are ignored. A gap in a stream is logged and counted in
/// `missed_events`, then the envelope is applied; `remaining` is carried as
/// an absolute value, so it converges on the next event.
#[derive(Debug)]
pub struct SkuAvailabilityProjection<S>
where
    S: ReadStore<AvailabilityId, SkuAvailabilityView>,
{
    store: S,
    cursors: RwLock<HashMap<AvailabilityId, u64>>,
}

impl<S> SkuAvailabilityProjection<S>
where
    S: ReadStore<AvailabilityId, SkuAvailabilityView>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, availability_id: &AvailabilityId) -> Option<SkuAvailabilityView> {
        self.store.get(availability_id)
    }

    pub fn list(&self) -> Vec<SkuAvailabilityView> {
        self.store.list()
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> anyhow::Result<()> {
        if envelope.aggregate_type() != AVAILABILITY_AGGREGATE_TYPE {
            return Ok(());
        }

        let availability_id = AvailabilityId::from_uuid(envelope.aggregate_id());
        let seq = envelope.sequence_number();

        let mut cursors = self
            .cursors
            .write()
            .map_err(|_| anyhow!("projection cursor lock poisoned"))?;
        let last = cursors.get(&availability_id).copied().unwrap_or(0);

        if seq == 0 {
            bail!("availability {availability_id}: sequence number 0 is invalid");
        }
        if seq <= last {
            // Duplicate or replay.
            return Ok(());
        }
        let missed = if last != 0 { seq - last - 1 } else { 0 };

        let event: AvailabilityEvent = serde_json::from_value(envelope.payload().clone())
            .with_context(|| format!("decode {} payload", envelope.event_type()))?;

        if event.availability_id() != availability_id {
            bail!(
                "event availability_id {} does not match envelope aggregate_id {availability_id}",
                event.availability_id()
            );
        }

        let mut view = self
            .store
            .get(&availability_id)
            .unwrap_or_else(|| SkuAvailabilityView::empty(availability_id));

        match event {
            AvailabilityEvent::PurchaseRecorded(e) => {
                view.purchases += 1;
                view.units_sold += u64::from(e.quantity);
                view.remaining = e.remaining;
            }
            AvailabilityEvent::Restocked(e) => {
                view.remaining = Some(e.num_products);
            }
            AvailabilityEvent::FlagChanged(_) | AvailabilityEvent::WindowChanged(_) => {}
        }
        if missed > 0 {
            warn!(
                availability_id = %availability_id,
                last,
                found = seq,
                "availability stream gap; skipping missing events"
            );
            view.missed_events += missed;
        }
        view.last_sequence = seq;

        self.store.upsert(availability_id, view);
        cursors.insert(availability_id, seq);

        Ok(())
    }

    /// Drop the view and rebuild it by replaying `envelopes`.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> anyhow::Result<()> {
        self.cursors
            .write()
            .map_err(|_| anyhow!("projection cursor lock poisoned"))?
            .clear();
        self.store.clear();

        let mut envs: Vec<_> = envelopes.into_iter().collect();
        envs.sort_by_key(|e| (*e.aggregate_id().as_bytes(), e.sequence_number()));

        for env in &envs {
            self.apply_envelope(env)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shelfkit_availability::{PurchaseRecorded, Restocked};
    use shelfkit_events::Event;
    use uuid::Uuid;

    use crate::read_model::InMemoryReadStore;

    fn projection() -> SkuAvailabilityProjection<InMemoryReadStore<AvailabilityId, SkuAvailabilityView>> {
        SkuAvailabilityProjection::new(InMemoryReadStore::new())
    }

    fn envelope(id: AvailabilityId, seq: u64, event: AvailabilityEvent) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            Uuid::now_v7(),
            *id.as_uuid(),
            AVAILABILITY_AGGREGATE_TYPE,
            seq,
            event.event_type(),
            serde_json::to_value(&event).unwrap(),
        )
    }

    fn purchase(id: AvailabilityId, quantity: u32, remaining: u32) -> AvailabilityEvent {
        AvailabilityEvent::PurchaseRecorded(PurchaseRecorded {
            availability_id: id,
            quantity,
            remaining: Some(remaining),
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn purchases_accumulate() {
        let p = projection();
        let id = AvailabilityId::new();

        p.apply_envelope(&envelope(id, 1, purchase(id, 2, 8))).unwrap();
        p.apply_envelope(&envelope(id, 2, purchase(id, 3, 5))).unwrap();

        let view = p.get(&id).unwrap();
        assert_eq!(view.purchases, 2);
        assert_eq!(view.units_sold, 5);
        assert_eq!(view.remaining, Some(5));
        assert_eq!(view.last_sequence, 2);
    }

    #[test]
    fn duplicate_envelope_is_ignored() {
        let p = projection();
        let id = AvailabilityId::new();
        let env = envelope(id, 1, purchase(id, 1, 4));

        p.apply_envelope(&env).unwrap();
        p.apply_envelope(&env).unwrap();

        assert_eq!(p.get(&id).unwrap().purchases, 1);
    }

    #[test]
    fn gap_is_counted_and_later_events_still_apply() {
        let p = projection();
        let id = AvailabilityId::new();

        p.apply_envelope(&envelope(id, 1, purchase(id, 1, 9))).unwrap();
        p.apply_envelope(&envelope(id, 3, purchase(id, 1, 7))).unwrap();
        p.apply_envelope(&envelope(id, 4, purchase(id, 2, 5))).unwrap();

        let view = p.get(&id).unwrap();
        assert_eq!(view.last_sequence, 4);
        assert_eq!(view.missed_events, 1);
        assert_eq!(view.purchases, 3);
        assert_eq!(view.remaining, Some(5));

        // The late envelope is now behind the cursor.
        p.apply_envelope(&envelope(id, 2, purchase(id, 1, 8))).unwrap();
        assert_eq!(p.get(&id).unwrap().purchases, 3);
    }

    #[test]
    fn mismatched_ids_are_rejected() {
        let p = projection();
        let id = AvailabilityId::new();
        let other = AvailabilityId::new();

        assert!(p.apply_envelope(&envelope(id, 1, purchase(other, 1, 4))).is_err());
        assert!(p.get(&id).is_none());
    }

    #[test]
    fn other_aggregate_types_are_skipped() {
        let p = projection();
        let id = AvailabilityId::new();
        let env = EventEnvelope::new(
            Uuid::now_v7(),
            *id.as_uuid(),
            "catalog.product",
            1,
            "catalog.product.created",
            serde_json::json!({}),
        );

        p.apply_envelope(&env).unwrap();
        assert!(p.list().is_empty());
    }

    #[test]
    fn rebuild_replays_in_stream_order() {
        let p = projection();
        let id = AvailabilityId::new();
        let restock = AvailabilityEvent::Restocked(Restocked {
            availability_id: id,
            quantity: 10,
            num_products: 12,
            occurred_at: Utc::now(),
        });

        p.apply_envelope(&envelope(id, 1, purchase(id, 99, 0))).unwrap();

        p.rebuild_from_scratch(vec![
            envelope(id, 2, restock),
            envelope(id, 1, purchase(id, 1, 2)),
        ])
        .unwrap();

        let view = p.get(&id).unwrap();
        assert_eq!(view.purchases, 1);
        assert_eq!(view.units_sold, 1);
        assert_eq!(view.remaining, Some(12));
    }
}
