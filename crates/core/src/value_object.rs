//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Item types (a name + category pair), tool states and snapshots of remote
/// entities are values: two instances holding the same fields are the same
/// thing, and "changing" one means building a new one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct ItemType { name: String, category: String }
///
/// impl ValueObject for ItemType {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
