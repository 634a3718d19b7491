//! Entity trait: identity that survives state changes.

/// Entity marker + minimal interface.
///
/// Catalog records (product types, options, products, SKUs) are entities: two
/// records with the same id are the same record even if their fields differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
