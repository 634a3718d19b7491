use serde::{Deserialize, Serialize};
use thiserror::Error;

use shelfkit_availability::{
    Availability, AvailabilityCommand, AvailabilityError, AvailabilityEvent, AvailabilityPolicy,
    AvailabilityStrategy, AvailabilityTypeRegistry,
};
use shelfkit_core::{AggregateRoot, AvailabilityId, ExpectedVersion};
use std::sync::Arc;

/// The persisted form of an availability.
///
/// `type_code` and the policy's variant are stored separately, the way a row
/// and its companion strategy row would be; loading checks they agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub id: AvailabilityId,
    pub type_code: String,
    pub type_name: String,
    pub policy: AvailabilityPolicy,
    pub version: u64,
}

impl AvailabilityRecord {
    pub fn from_availability(availability: &Availability) -> Self {
        Self {
            id: availability.id_typed(),
            type_code: availability.availability_type().code.clone(),
            type_name: availability.availability_type().name.clone(),
            policy: *availability.policy(),
            version: availability.version(),
        }
    }

    /// Rebuild the aggregate, checking the record against the registry.
    ///
    /// An unregistered code or a policy of the wrong variant means the stored
    /// data is inconsistent; both surface as `StoreError::Integrity`.
    pub fn to_availability(&self, registry: &AvailabilityTypeRegistry) -> Result<Availability, StoreError> {
        let registered = registry.resolve(&self.type_code).map_err(|e| {
            StoreError::Integrity(format!("availability {}: {e}", self.id))
        })?;

        if registered.kind() != self.policy.kind() {
            return Err(StoreError::Integrity(format!(
                "availability {} has type '{}' ({}) but its stored policy is {}",
                self.id,
                self.type_code,
                registered.kind(),
                self.policy.kind()
            )));
        }

        Availability::restore(self.id, registered, self.policy, self.version)
            .map_err(|e| StoreError::Integrity(format!("availability {}: {e}", self.id)))
    }
}

/// Result of a committed command: the new state and the events applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub availability: Availability,
    pub events: Vec<AvailabilityEvent>,
}

/// Availability store operation error.
///
/// `Availability` carries business failures (such as
/// `QuantityExceedsAvailable`) unchanged; the other variants are storage or
/// data-integrity failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("availability {0} not found")]
    NotFound(AvailabilityId),

    #[error("availability {0} already exists")]
    AlreadyExists(AvailabilityId),

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("event publication failed: {0}")]
    Publish(String),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),
}

impl StoreError {
    /// Whether the request failed only because it would overdraw stock.
    pub fn is_quantity_exceeded(&self) -> bool {
        matches!(self, StoreError::Availability(e) if e.is_quantity_exceeded())
    }
}

/// Storage for availability records.
///
/// Implementations must:
/// - run `execute_with` as one atomic read-decide-apply-persist step per id, so
///   concurrent commands against one availability are linearized
/// - leave stored state untouched when the command is rejected
/// - persist before returning, so a fresh `load` observes the change
pub trait AvailabilityStore: Send + Sync {
    /// The registry used to validate records on load.
    fn registry(&self) -> &AvailabilityTypeRegistry;

    /// Store a new availability.
    fn insert(&self, availability: &Availability) -> Result<(), StoreError>;

    /// Load the current state of an availability.
    fn load(&self, id: AvailabilityId) -> Result<Availability, StoreError>;

    /// Decide, apply, and persist `command` under exclusive access to `id`,
    /// then run `on_commit` before that access is released.
    ///
    /// `on_commit` only runs when events were committed, so whatever it emits
    /// for one id comes out in version order. If it fails the persisted change
    /// stands and its error is returned.
    fn execute_with(
        &self,
        id: AvailabilityId,
        command: &AvailabilityCommand,
        expected_version: ExpectedVersion,
        on_commit: &mut dyn FnMut(&Committed) -> Result<(), StoreError>,
    ) -> Result<Committed, StoreError>;

    /// `execute_with` without a commit hook.
    fn execute(
        &self,
        id: AvailabilityId,
        command: &AvailabilityCommand,
        expected_version: ExpectedVersion,
    ) -> Result<Committed, StoreError> {
        self.execute_with(id, command, expected_version, &mut |_: &Committed| Ok(()))
    }

    /// All stored ids.
    fn ids(&self) -> Result<Vec<AvailabilityId>, StoreError>;
}

impl<S> AvailabilityStore for Arc<S>
where
    S: AvailabilityStore + ?Sized,
{
    fn registry(&self) -> &AvailabilityTypeRegistry {
        (**self).registry()
    }

    fn insert(&self, availability: &Availability) -> Result<(), StoreError> {
        (**self).insert(availability)
    }

    fn load(&self, id: AvailabilityId) -> Result<Availability, StoreError> {
        (**self).load(id)
    }

    fn execute_with(
        &self,
        id: AvailabilityId,
        command: &AvailabilityCommand,
        expected_version: ExpectedVersion,
        on_commit: &mut dyn FnMut(&Committed) -> Result<(), StoreError>,
    ) -> Result<Committed, StoreError> {
        (**self).execute_with(id, command, expected_version, on_commit)
    }

    fn ids(&self) -> Result<Vec<AvailabilityId>, StoreError> {
        (**self).ids()
    }
}
