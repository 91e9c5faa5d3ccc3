//! Guard against a borrower renting the same item type twice at once.
//!
//! Stock is bucket-aggregated, so the check works on bucket ids: it asks
//! inventory which buckets currently hold the item type in `Loaned` state and
//! looks for an open loan of the borrower pointing at one of them. Two
//! physical units of one item type share a bucket row, so the guard cannot
//! tell them apart.

use toolrent_core::{BorrowerId, DomainError, DomainResult};
use toolrent_inventory::ToolState;

use crate::collaborators::{InventoryCollaborator, ToolSnapshot};
use crate::store::LoanStore;

pub struct CollisionGuard<'a, L, I> {
    loans: &'a L,
    inventory: &'a I,
}

impl<'a, L, I> CollisionGuard<'a, L, I>
where
    L: LoanStore,
    I: InventoryCollaborator,
{
    pub fn new(loans: &'a L, inventory: &'a I) -> Self {
        Self { loans, inventory }
    }

    /// Fails with a validation error if `borrower` already holds `tool`'s item
    /// type under an open loan. Inventory errors propagate.
    pub fn check(&self, borrower: &BorrowerId, tool: &ToolSnapshot) -> DomainResult<()> {
        let loaned = self
            .inventory
            .find_ids_by_triple(&tool.name, &tool.category, ToolState::Loaned)?;
        if self.loans.open_loan_references_any(borrower, &loaned)? {
            return Err(DomainError::validation(format!(
                "borrower already has an active loan of this tool ({} - {})",
                tool.name, tool.category
            )));
        }
        Ok(())
    }
}
