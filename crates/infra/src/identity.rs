use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use toolrent_core::{BorrowerId, DomainError, DomainResult};
use toolrent_loans::{IdentityCollaborator, StandingSource};

/// In-memory borrower directory holding each borrower's active flag.
///
/// Flags are (re)derived from loan standing on `recompute`. A borrower with no
/// stored flag yet is judged live from the standing source.
pub struct BorrowerDirectory {
    flags: RwLock<HashMap<BorrowerId, bool>>,
    standing: Arc<dyn StandingSource>,
}

impl BorrowerDirectory {
    pub fn new(standing: Arc<dyn StandingSource>) -> Self {
        Self {
            flags: RwLock::new(HashMap::new()),
            standing,
        }
    }
}

fn poisoned() -> DomainError {
    DomainError::unavailable("borrower directory lock poisoned")
}

impl IdentityCollaborator for BorrowerDirectory {
    fn borrower_active(&self, borrower: &BorrowerId) -> DomainResult<bool> {
        if let Some(flag) = self.flags.read().map_err(|_| poisoned())?.get(borrower) {
            return Ok(*flag);
        }
        Ok(self.standing.standing(borrower)?.is_active())
    }

    fn recompute_borrower_active(&self, borrower: &BorrowerId) -> DomainResult<()> {
        let active = self.standing.standing(borrower)?.is_active();
        let previous = self
            .flags
            .write()
            .map_err(|_| poisoned())?
            .insert(borrower.clone(), active);
        if previous != Some(active) {
            tracing::info!(borrower = %borrower, active, "borrower active flag updated");
        }
        Ok(())
    }
}
