use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use shelfkit_availability::{Availability, AvailabilityCommand, AvailabilityTypeRegistry};
use shelfkit_core::{AggregateRoot, AvailabilityId, ExpectedVersion};

use super::r#trait::{AvailabilityRecord, AvailabilityStore, Committed, StoreError};

/// In-memory availability store.
///
/// The index is behind a `RwLock`; each record sits behind its own `Mutex`,
/// so commands against one id run one at a time while different ids proceed
/// in parallel. Intended for tests/dev.
#[derive(Debug)]
pub struct InMemoryAvailabilityStore {
    registry: AvailabilityTypeRegistry,
    records: RwLock<HashMap<AvailabilityId, Arc<Mutex<AvailabilityRecord>>>>,
}

impl InMemoryAvailabilityStore {
    pub fn new(registry: AvailabilityTypeRegistry) -> Self {
        Self {
            registry,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Store a raw record without validating it (bulk import of existing
    /// rows). Inconsistent records are reported when loaded.
    pub fn import_record(&self, record: AvailabilityRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        if records.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id));
        }
        records.insert(record.id, Arc::new(Mutex::new(record)));
        Ok(())
    }

    /// Copy of the stored record, as persisted.
    pub fn record(&self, id: AvailabilityId) -> Result<AvailabilityRecord, StoreError> {
        let slot = self.slot(id)?;
        let record = slot.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(record.clone())
    }

    fn slot(&self, id: AvailabilityId) -> Result<Arc<Mutex<AvailabilityRecord>>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        records.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }
}

impl Default for InMemoryAvailabilityStore {
    fn default() -> Self {
        Self::new(AvailabilityTypeRegistry::standard())
    }
}

impl AvailabilityStore for InMemoryAvailabilityStore {
    fn registry(&self) -> &AvailabilityTypeRegistry {
        &self.registry
    }

    fn insert(&self, availability: &Availability) -> Result<(), StoreError> {
        let record = AvailabilityRecord::from_availability(availability);
        // Validate against this store's registry before accepting.
        record.to_availability(&self.registry)?;
        self.import_record(record)
    }

    fn load(&self, id: AvailabilityId) -> Result<Availability, StoreError> {
        self.record(id)?.to_availability(&self.registry)
    }

    fn execute_with(
        &self,
        id: AvailabilityId,
        command: &AvailabilityCommand,
        expected_version: ExpectedVersion,
        on_commit: &mut dyn FnMut(&Committed) -> Result<(), StoreError>,
    ) -> Result<Committed, StoreError> {
        let slot = self.slot(id)?;

        // Held until the new state is written back and `on_commit` returns.
        let mut record = slot.lock().map_err(|_| StoreError::Poisoned)?;

        let mut availability = record.to_availability(&self.registry)?;
        if !expected_version.matches(availability.version()) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected_version:?}, found {}",
                availability.version()
            )));
        }

        let events = availability.execute(command)?;
        let committed = Committed {
            availability,
            events,
        };
        if !committed.events.is_empty() {
            *record = AvailabilityRecord::from_availability(&committed.availability);
            on_commit(&committed)?;
        }

        Ok(committed)
    }

    fn ids(&self) -> Result<Vec<AvailabilityId>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        let mut ids: Vec<_> = records.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shelfkit_availability::{
        AvailabilityError, AvailabilityKind, AvailabilityPolicy, BooleanAvailability,
        CountdownAvailability, RecordPurchase,
    };

    fn store() -> InMemoryAvailabilityStore {
        InMemoryAvailabilityStore::default()
    }

    fn countdown(store: &InMemoryAvailabilityStore, n: u32) -> AvailabilityId {
        let availability = store
            .registry()
            .create_with(AvailabilityId::new(), "countdown", CountdownAvailability::new(n))
            .unwrap();
        store.insert(&availability).unwrap();
        availability.id_typed()
    }

    fn purchase(id: AvailabilityId, quantity: u32) -> AvailabilityCommand {
        AvailabilityCommand::RecordPurchase(RecordPurchase {
            availability_id: id,
            quantity,
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn purchase_is_visible_on_fresh_load() {
        let store = store();
        let id = countdown(&store, 5);

        let committed = store.execute(id, &purchase(id, 3), ExpectedVersion::Any).unwrap();
        assert_eq!(committed.events.len(), 1);

        let fresh = store.load(id).unwrap();
        assert_eq!(fresh.policy().remaining(), Some(2));
        assert_eq!(fresh.version(), 1);
    }

    #[test]
    fn rejected_purchase_leaves_record_untouched() {
        let store = store();
        let id = countdown(&store, 2);
        let before = store.record(id).unwrap();

        let err = store.execute(id, &purchase(id, 3), ExpectedVersion::Any).unwrap_err();
        assert!(err.is_quantity_exceeded());
        assert!(matches!(
            err,
            StoreError::Availability(AvailabilityError::QuantityExceedsAvailable {
                requested: 3,
                available: 2
            })
        ));
        assert_eq!(store.record(id).unwrap(), before);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = store();
        let id = AvailabilityId::new();
        assert!(matches!(store.load(id), Err(StoreError::NotFound(missing)) if missing == id));
        assert!(matches!(
            store.execute(id, &purchase(id, 1), ExpectedVersion::Any),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = store();
        let id = countdown(&store, 1);
        let again = store.load(id).unwrap();
        assert!(matches!(store.insert(&again), Err(StoreError::AlreadyExists(_))));
    }

    #[test]
    fn record_with_mismatched_policy_fails_integrity_check() {
        let store = store();
        let id = AvailabilityId::new();
        store
            .import_record(AvailabilityRecord {
                id,
                type_code: "countdown".to_string(),
                type_name: "Limited quantity".to_string(),
                policy: AvailabilityPolicy::Boolean(BooleanAvailability::new(true)),
                version: 0,
            })
            .unwrap();

        assert!(matches!(store.load(id), Err(StoreError::Integrity(_))));
        assert!(matches!(
            store.execute(id, &purchase(id, 1), ExpectedVersion::Any),
            Err(StoreError::Integrity(_))
        ));
    }

    #[test]
    fn record_with_unregistered_code_fails_integrity_check() {
        let store = InMemoryAvailabilityStore::new(AvailabilityTypeRegistry::with_kinds([
            AvailabilityKind::Boolean,
        ]));
        let id = AvailabilityId::new();
        store
            .import_record(AvailabilityRecord {
                id,
                type_code: "countdown".to_string(),
                type_name: "Limited quantity".to_string(),
                policy: AvailabilityPolicy::Countdown(CountdownAvailability::new(1)),
                version: 0,
            })
            .unwrap();

        assert!(matches!(store.load(id), Err(StoreError::Integrity(_))));
    }

    #[test]
    fn stale_expected_version_is_a_conflict() {
        let store = store();
        let id = countdown(&store, 5);
        store.execute(id, &purchase(id, 1), ExpectedVersion::Exact(0)).unwrap();

        let err = store
            .execute(id, &purchase(id, 1), ExpectedVersion::Exact(0))
            .unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));
        assert_eq!(store.load(id).unwrap().policy().remaining(), Some(4));
    }

    #[test]
    fn commit_hook_sees_versions_in_order_under_contention() {
        use std::sync::{Arc, Mutex};
        use std::thread;

        const BUYERS: u32 = 48;
        let store = Arc::new(store());
        let id = countdown(&store, BUYERS);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..BUYERS)
            .map(|_| {
                let store = Arc::clone(&store);
                let seen = Arc::clone(&seen);
                thread::spawn(move || {
                    store
                        .execute_with(id, &purchase(id, 1), ExpectedVersion::Any, &mut |c: &Committed| {
                            seen.lock().unwrap().push(c.availability.version());
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen, (1..=u64::from(BUYERS)).collect::<Vec<_>>());
    }

    #[test]
    fn commit_hook_skipped_on_rejection_and_failure_keeps_state() {
        let store = store();
        let id = countdown(&store, 1);
        let mut calls = 0;

        let err = store
            .execute_with(id, &purchase(id, 2), ExpectedVersion::Any, &mut |_: &Committed| {
                calls += 1;
                Ok(())
            })
            .unwrap_err();
        assert!(err.is_quantity_exceeded());
        assert_eq!(calls, 0);

        let err = store
            .execute_with(id, &purchase(id, 1), ExpectedVersion::Any, &mut |_: &Committed| {
                Err(StoreError::Publish("bus down".to_string()))
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Publish(_)));
        assert_eq!(store.load(id).unwrap().policy().remaining(), Some(0));
    }

    #[test]
    fn ids_lists_everything_stored() {
        let store = store();
        let a = countdown(&store, 1);
        let b = countdown(&store, 1);
        let ids = store.ids().unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a) && ids.contains(&b));
    }
}
