//! Contracts for everything the loan orchestrator talks to outside its own
//! store: inventory, borrower identity, and settings.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use toolrent_core::{ActorId, BorrowerId, BucketId, DomainError, DomainResult};
use toolrent_inventory::{Bucket, ToolState};

/// Point-in-time copy of one inventory bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSnapshot {
    pub id: BucketId,
    pub name: String,
    pub category: String,
    pub state: ToolState,
    pub amount: i64,
    pub reposition_value: i64,
}

impl From<Bucket> for ToolSnapshot {
    fn from(bucket: Bucket) -> Self {
        Self {
            id: bucket.id_typed(),
            name: bucket.name().to_string(),
            category: bucket.category().to_string(),
            state: bucket.state(),
            amount: bucket.amount(),
            reposition_value: bucket.reposition_value(),
        }
    }
}

/// Inventory as seen by the orchestrator (possibly across a network hop).
///
/// Transport failures must surface as [`DomainError::Unavailable`]; the
/// orchestrator treats every error from here as fatal to the current call.
pub trait InventoryCollaborator: Send + Sync {
    fn get_tool(&self, tool_id: BucketId) -> DomainResult<ToolSnapshot>;

    /// Move one unit out of `tool_id` into its `state` sibling; returns the
    /// destination bucket.
    fn move_tool_state(
        &self,
        tool_id: BucketId,
        state: ToolState,
        actor: &ActorId,
    ) -> DomainResult<ToolSnapshot>;

    fn find_ids_by_triple(&self, name: &str, category: &str, state: ToolState) -> DomainResult<Vec<BucketId>>;
}

impl<I> InventoryCollaborator for Arc<I>
where
    I: InventoryCollaborator + ?Sized,
{
    fn get_tool(&self, tool_id: BucketId) -> DomainResult<ToolSnapshot> {
        (**self).get_tool(tool_id)
    }

    fn move_tool_state(
        &self,
        tool_id: BucketId,
        state: ToolState,
        actor: &ActorId,
    ) -> DomainResult<ToolSnapshot> {
        (**self).move_tool_state(tool_id, state, actor)
    }

    fn find_ids_by_triple(&self, name: &str, category: &str, state: ToolState) -> DomainResult<Vec<BucketId>> {
        (**self).find_ids_by_triple(name, category, state)
    }
}

/// Borrower active flag owner.
///
/// Neither call may block a loan operation: callers treat an error from
/// `borrower_active` as "unknown" and ignore errors from `recompute`.
pub trait IdentityCollaborator: Send + Sync {
    fn borrower_active(&self, borrower: &BorrowerId) -> DomainResult<bool>;

    fn recompute_borrower_active(&self, borrower: &BorrowerId) -> DomainResult<()>;
}

/// Identity side that knows nothing; every borrower is active.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysActive;

impl IdentityCollaborator for AlwaysActive {
    fn borrower_active(&self, _borrower: &BorrowerId) -> DomainResult<bool> {
        Ok(true)
    }

    fn recompute_borrower_active(&self, _borrower: &BorrowerId) -> DomainResult<()> {
        Ok(())
    }
}

/// Settings read by the orchestrator on every call.
pub trait ConfigCollaborator: Send + Sync {
    fn daily_rent_rate(&self) -> i64;

    fn check_borrower_active(&self) -> bool;

    fn max_open_loans(&self) -> usize {
        LoanSettings::DEFAULT_MAX_OPEN_LOANS
    }
}

/// Static loan settings, built once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSettings {
    pub daily_rent_rate: i64,
    pub check_borrower_active: bool,
    pub max_open_loans: usize,
}

impl LoanSettings {
    pub const DEFAULT_DAILY_RENT_RATE: i64 = 2500;
    pub const DEFAULT_MAX_OPEN_LOANS: usize = 5;

    pub fn validate(self) -> DomainResult<Self> {
        if self.daily_rent_rate < 0 {
            return Err(DomainError::validation("daily rent rate cannot be negative"));
        }
        if self.max_open_loans == 0 {
            return Err(DomainError::validation("max open loans must be at least 1"));
        }
        Ok(self)
    }
}

impl Default for LoanSettings {
    fn default() -> Self {
        Self {
            daily_rent_rate: Self::DEFAULT_DAILY_RENT_RATE,
            check_borrower_active: false,
            max_open_loans: Self::DEFAULT_MAX_OPEN_LOANS,
        }
    }
}

impl ConfigCollaborator for LoanSettings {
    fn daily_rent_rate(&self) -> i64 {
        self.daily_rent_rate
    }

    fn check_borrower_active(&self) -> bool {
        self.check_borrower_active
    }

    fn max_open_loans(&self) -> usize {
        self.max_open_loans
    }
}

/// What the loan records say about a borrower.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerStanding {
    pub has_overdue: bool,
    pub has_unpaid_late_fine: bool,
    pub has_unpaid_damage: bool,
}

impl BorrowerStanding {
    /// A borrower is active iff nothing is overdue or unpaid.
    pub fn is_active(&self) -> bool {
        !(self.has_overdue || self.has_unpaid_late_fine || self.has_unpaid_damage)
    }
}

/// Source of borrower standing (the loan records).
pub trait StandingSource: Send + Sync {
    fn standing(&self, borrower: &BorrowerId) -> DomainResult<BorrowerStanding>;
}

impl<S> StandingSource for Arc<S>
where
    S: StandingSource + ?Sized,
{
    fn standing(&self, borrower: &BorrowerId) -> DomainResult<BorrowerStanding> {
        (**self).standing(borrower)
    }
}
