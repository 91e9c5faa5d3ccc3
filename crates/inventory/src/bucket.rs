use serde::{Deserialize, Serialize};

use toolrent_core::{BucketId, DomainError, DomainResult, Entity, ValueObject};

use crate::state::ToolState;

/// A class of interchangeable tools: the (name, category) pair.
///
/// Keeps the caller's casing for display; comparisons go through [`BucketKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemType {
    pub name: String,
    pub category: String,
}

impl ValueObject for ItemType {}

impl ItemType {
    /// Build an item type from raw input, trimming and rejecting blanks.
    pub fn parse(name: &str, category: &str) -> DomainResult<Self> {
        let name = name.trim();
        let category = category.trim();
        if name.is_empty() {
            return Err(DomainError::validation("tool name is required"));
        }
        if category.is_empty() {
            return Err(DomainError::validation("tool category is required"));
        }
        Ok(Self {
            name: name.to_string(),
            category: category.to_string(),
        })
    }

    pub fn key(&self, state: ToolState) -> BucketKey {
        BucketKey::new(&self.name, &self.category, state)
    }

    fn same_as(&self, other: &ItemType) -> bool {
        fold(&self.name) == fold(&other.name) && fold(&self.category) == fold(&other.category)
    }
}

/// Case-insensitive identity of a bucket: (name, category, state).
///
/// Ordered so that several keys can be locked in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    name: String,
    category: String,
    state: ToolState,
}

impl BucketKey {
    pub fn new(name: &str, category: &str, state: ToolState) -> Self {
        Self {
            name: fold(name),
            category: fold(category),
            state,
        }
    }

    pub fn state(&self) -> ToolState {
        self.state
    }

    /// Key of the sibling bucket holding the same item type in `state`.
    pub fn with_state(&self, state: ToolState) -> Self {
        Self {
            name: self.name.clone(),
            category: self.category.clone(),
            state,
        }
    }
}

fn fold(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Stock of one item type in one state.
///
/// Buckets are never deleted; a bucket may sit at amount 0 indefinitely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    id: BucketId,
    name: String,
    category: String,
    state: ToolState,
    amount: i64,
    reposition_value: i64,
}

impl Bucket {
    pub(crate) fn new(
        item: &ItemType,
        state: ToolState,
        amount: i64,
        reposition_value: i64,
    ) -> Self {
        Self {
            id: BucketId::new(),
            name: item.name.clone(),
            category: item.category.clone(),
            state,
            amount,
            reposition_value,
        }
    }

    pub fn id_typed(&self) -> BucketId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn item_type(&self) -> ItemType {
        ItemType {
            name: self.name.clone(),
            category: self.category.clone(),
        }
    }

    pub fn state(&self) -> ToolState {
        self.state
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn reposition_value(&self) -> i64 {
        self.reposition_value
    }

    /// Derived availability flag: true iff the bucket holds `Available` stock.
    pub fn is_available(&self) -> bool {
        self.state.is_available()
    }

    pub fn key(&self) -> BucketKey {
        BucketKey::new(&self.name, &self.category, self.state)
    }

    pub fn is_item_type(&self, item: &ItemType) -> bool {
        self.item_type().same_as(item)
    }

    pub(crate) fn add_units(&mut self, units: i64) {
        self.amount += units;
    }

    pub(crate) fn take_unit(&mut self) -> DomainResult<()> {
        if self.amount <= 0 {
            return Err(DomainError::validation(format!(
                "no stock available in bucket {} ({} - {}, {})",
                self.id, self.name, self.category, self.state
            )));
        }
        self.amount -= 1;
        Ok(())
    }

    pub(crate) fn set_amount(&mut self, amount: i64) {
        self.amount = amount;
    }

    pub(crate) fn set_reposition_value(&mut self, value: i64) {
        self.reposition_value = value;
    }
}

impl Entity for Bucket {
    type Id = BucketId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
