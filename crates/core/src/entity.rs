//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Products, orders, categories and suppliers are entities: two products with
/// the same title and price are still different products.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
