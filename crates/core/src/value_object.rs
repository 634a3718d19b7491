//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity of their own and are never mutated in place.
/// In the catalog these are reference data such as an availability type
/// (`{ name, code }`) or a SKU's option/value selection.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct AvailabilityType { name: String, code: String }
///
/// impl ValueObject for AvailabilityType {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
