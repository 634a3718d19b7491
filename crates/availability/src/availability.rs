use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shelfkit_core::{Aggregate, AggregateRoot, AvailabilityId, DomainError};
use shelfkit_events::Event;

use crate::date_range::DateRangeAvailability;
use crate::error::{AvailabilityError, AvailabilityResult};
use crate::kind::{AvailabilityKind, AvailabilityType, RegisteredType};
use crate::policy::AvailabilityPolicy;
use crate::strategy::AvailabilityStrategy;

/// Aggregate type name used on published envelopes.
pub const AVAILABILITY_AGGREGATE_TYPE: &str = "availability";

/// Aggregate root: Availability.
///
/// One per SKU. Fronts exactly one policy whose variant matches the type code,
/// so a SKU keeps a single reference whichever policy governs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    id: AvailabilityId,
    availability_type: AvailabilityType,
    policy: AvailabilityPolicy,
    version: u64,
}

impl Availability {
    /// Create a new availability for a registered type.
    pub fn new(
        id: AvailabilityId,
        registered: &RegisteredType,
        policy: AvailabilityPolicy,
    ) -> AvailabilityResult<Self> {
        Self::restore(id, registered, policy, 0)
    }

    /// Rebuild an availability from persisted parts.
    pub fn restore(
        id: AvailabilityId,
        registered: &RegisteredType,
        policy: AvailabilityPolicy,
        version: u64,
    ) -> AvailabilityResult<Self> {
        if policy.kind() != registered.kind() {
            return Err(AvailabilityError::PolicyMismatch {
                code: registered.code().to_string(),
                expected: registered.kind(),
                found: policy.kind(),
            });
        }
        if let AvailabilityPolicy::DateRange(window) = &policy {
            window.validate()?;
        }

        Ok(Self {
            id,
            availability_type: registered.availability_type().clone(),
            policy,
            version,
        })
    }

    pub fn id_typed(&self) -> AvailabilityId {
        self.id
    }

    pub fn availability_type(&self) -> &AvailabilityType {
        &self.availability_type
    }

    pub fn kind(&self) -> AvailabilityKind {
        self.policy.kind()
    }

    pub fn policy(&self) -> &AvailabilityPolicy {
        &self.policy
    }

    /// Whether the item can be bought on `today`.
    pub fn available_on(&self, today: NaiveDate) -> bool {
        self.policy.available_on(today)
    }

    /// Whether the item can be bought today (local date).
    pub fn available(&self) -> bool {
        self.policy.available()
    }

    pub fn quantity_available(&self, quantity: u32) -> bool {
        self.policy.quantity_available(quantity)
    }

    /// Record a purchase of `quantity` units.
    ///
    /// `QuantityExceedsAvailable` is returned unchanged and nothing is mutated.
    pub fn record_purchase(&mut self, quantity: u32) -> AvailabilityResult<()> {
        let command = AvailabilityCommand::RecordPurchase(RecordPurchase {
            availability_id: self.id,
            quantity,
            occurred_at: Utc::now(),
        });
        self.execute(&command).map(|_| ())
    }

    /// Decide and apply a command in one step, returning the applied events.
    pub fn execute(&mut self, command: &AvailabilityCommand) -> AvailabilityResult<Vec<AvailabilityEvent>> {
        let events = self.handle(command)?;
        for event in &events {
            self.apply(event);
        }
        Ok(events)
    }
}

impl AggregateRoot for Availability {
    type Id = AvailabilityId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RecordPurchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPurchase {
    pub availability_id: AvailabilityId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetAvailable (boolean policies).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAvailable {
    pub availability_id: AvailabilityId,
    pub is_available: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Restock (countdown policies).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restock {
    pub availability_id: AvailabilityId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetWindow (date-range policies).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetWindow {
    pub availability_id: AvailabilityId,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityCommand {
    RecordPurchase(RecordPurchase),
    SetAvailable(SetAvailable),
    Restock(Restock),
    SetWindow(SetWindow),
}

impl AvailabilityCommand {
    pub fn availability_id(&self) -> AvailabilityId {
        match self {
            AvailabilityCommand::RecordPurchase(c) => c.availability_id,
            AvailabilityCommand::SetAvailable(c) => c.availability_id,
            AvailabilityCommand::Restock(c) => c.availability_id,
            AvailabilityCommand::SetWindow(c) => c.availability_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AvailabilityCommand::RecordPurchase(_) => "record_purchase",
            AvailabilityCommand::SetAvailable(_) => "set_available",
            AvailabilityCommand::Restock(_) => "restock",
            AvailabilityCommand::SetWindow(_) => "set_window",
        }
    }
}

/// Event: PurchaseRecorded.
///
/// `remaining` is the stock left afterwards for countdown policies and `None`
/// for policies that do not track quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecorded {
    pub availability_id: AvailabilityId,
    pub quantity: u32,
    pub remaining: Option<u32>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: FlagChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagChanged {
    pub availability_id: AvailabilityId,
    pub is_available: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: Restocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restocked {
    pub availability_id: AvailabilityId,
    pub quantity: u32,
    pub num_products: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: WindowChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowChanged {
    pub availability_id: AvailabilityId,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityEvent {
    PurchaseRecorded(PurchaseRecorded),
    FlagChanged(FlagChanged),
    Restocked(Restocked),
    WindowChanged(WindowChanged),
}

impl AvailabilityEvent {
    pub fn availability_id(&self) -> AvailabilityId {
        match self {
            AvailabilityEvent::PurchaseRecorded(e) => e.availability_id,
            AvailabilityEvent::FlagChanged(e) => e.availability_id,
            AvailabilityEvent::Restocked(e) => e.availability_id,
            AvailabilityEvent::WindowChanged(e) => e.availability_id,
        }
    }
}

impl Event for AvailabilityEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AvailabilityEvent::PurchaseRecorded(_) => "availability.purchase_recorded",
            AvailabilityEvent::FlagChanged(_) => "availability.flag_changed",
            AvailabilityEvent::Restocked(_) => "availability.restocked",
            AvailabilityEvent::WindowChanged(_) => "availability.window_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AvailabilityEvent::PurchaseRecorded(e) => e.occurred_at,
            AvailabilityEvent::FlagChanged(e) => e.occurred_at,
            AvailabilityEvent::Restocked(e) => e.occurred_at,
            AvailabilityEvent::WindowChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Availability {
    type Command = AvailabilityCommand;
    type Event = AvailabilityEvent;
    type Error = AvailabilityError;

    fn apply(&mut self, event: &Self::Event) {
        match (event, &mut self.policy) {
            (AvailabilityEvent::PurchaseRecorded(e), AvailabilityPolicy::Countdown(c)) => {
                if let Some(remaining) = e.remaining {
                    c.set_num_products(remaining);
                }
            }
            (AvailabilityEvent::FlagChanged(e), AvailabilityPolicy::Boolean(b)) => {
                b.set(e.is_available);
            }
            (AvailabilityEvent::Restocked(e), AvailabilityPolicy::Countdown(c)) => {
                c.set_num_products(e.num_products);
            }
            (AvailabilityEvent::WindowChanged(e), AvailabilityPolicy::DateRange(w)) => {
                w.set_bounds(e.start_date, e.end_date);
            }
            // Purchases against untracked policies leave state as is.
            _ => {}
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.ensure_availability_id(command.availability_id())?;

        match command {
            AvailabilityCommand::RecordPurchase(cmd) => self.handle_record_purchase(cmd),
            AvailabilityCommand::SetAvailable(cmd) => self.handle_set_available(cmd),
            AvailabilityCommand::Restock(cmd) => self.handle_restock(cmd),
            AvailabilityCommand::SetWindow(cmd) => self.handle_set_window(cmd),
        }
    }
}

impl Availability {
    fn ensure_availability_id(&self, availability_id: AvailabilityId) -> Result<(), DomainError> {
        if self.id != availability_id {
            return Err(DomainError::invariant("availability_id mismatch"));
        }
        Ok(())
    }

    fn unsupported(&self, command: &'static str) -> AvailabilityError {
        AvailabilityError::UnsupportedCommand {
            command,
            kind: self.kind(),
        }
    }

    fn handle_record_purchase(&self, cmd: &RecordPurchase) -> AvailabilityResult<Vec<AvailabilityEvent>> {
        // Decide on a copy; the aggregate itself only changes through apply().
        let mut policy = self.policy;
        policy.record_purchase(cmd.quantity)?;

        Ok(vec![AvailabilityEvent::PurchaseRecorded(PurchaseRecorded {
            availability_id: cmd.availability_id,
            quantity: cmd.quantity,
            remaining: policy.remaining(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_available(&self, cmd: &SetAvailable) -> AvailabilityResult<Vec<AvailabilityEvent>> {
        let AvailabilityPolicy::Boolean(current) = &self.policy else {
            return Err(self.unsupported("set_available"));
        };

        if current.is_available() == cmd.is_available {
            return Ok(vec![]);
        }

        Ok(vec![AvailabilityEvent::FlagChanged(FlagChanged {
            availability_id: cmd.availability_id,
            is_available: cmd.is_available,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_restock(&self, cmd: &Restock) -> AvailabilityResult<Vec<AvailabilityEvent>> {
        let AvailabilityPolicy::Countdown(current) = &self.policy else {
            return Err(self.unsupported("restock"));
        };

        if cmd.quantity == 0 {
            return Err(DomainError::validation("restock quantity cannot be zero").into());
        }

        let num_products = current
            .num_products()
            .checked_add(cmd.quantity)
            .ok_or_else(|| DomainError::invariant("stock counter would overflow"))?;

        Ok(vec![AvailabilityEvent::Restocked(Restocked {
            availability_id: cmd.availability_id,
            quantity: cmd.quantity,
            num_products,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_window(&self, cmd: &SetWindow) -> AvailabilityResult<Vec<AvailabilityEvent>> {
        let AvailabilityPolicy::DateRange(current) = &self.policy else {
            return Err(self.unsupported("set_window"));
        };

        let window = DateRangeAvailability::new(cmd.start_date, cmd.end_date)?;
        if &window == current {
            return Ok(vec![]);
        }

        Ok(vec![AvailabilityEvent::WindowChanged(WindowChanged {
            availability_id: cmd.availability_id,
            start_date: window.start_date(),
            end_date: window.end_date(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
