use thiserror::Error;

use shelfkit_core::DomainError;

use crate::kind::AvailabilityKind;

pub type AvailabilityResult<T> = Result<T, AvailabilityError>;

/// Failures raised by availability policies and the availability aggregate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    /// The requested purchase would overdraw tracked stock.
    ///
    /// Raised before any state changes; callers may treat it as "nothing
    /// happened".
    #[error("requested quantity {requested} exceeds available quantity {available}")]
    QuantityExceedsAvailable { requested: u32, available: u32 },

    /// No availability type is registered under this code.
    #[error("unknown availability type code '{0}'")]
    UnknownTypeCode(String),

    /// The policy attached to an availability does not match its type code.
    #[error("availability type '{code}' expects a {expected} policy, found {found}")]
    PolicyMismatch {
        code: String,
        expected: AvailabilityKind,
        found: AvailabilityKind,
    },

    /// An administrative command was sent to a policy that does not support it.
    #[error("command '{command}' is not supported by a {kind} policy")]
    UnsupportedCommand {
        command: &'static str,
        kind: AvailabilityKind,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AvailabilityError {
    pub fn is_quantity_exceeded(&self) -> bool {
        matches!(self, Self::QuantityExceedsAvailable { .. })
    }
}
