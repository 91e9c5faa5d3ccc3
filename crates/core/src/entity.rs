//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Stock buckets are entities: a bucket keeps its id while its amount moves,
/// and is never deleted even when it sits at zero.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
