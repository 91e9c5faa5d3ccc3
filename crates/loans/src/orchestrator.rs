//! Loan lifecycle: create (Open), return (Closed), pay fines.
//!
//! Creation and return move one inventory unit per item, one call at a time.
//! Those calls share no transaction: when item `k` fails, the moves already
//! made for items `1..k` stay committed and are only reported in the error
//! log. The loan record itself is written once, after every move succeeded.
//!
//! Return and payment hold a per-loan lock from the first read to the final
//! save, so one loan's units are released at most once.

use std::collections::BTreeSet;
use std::sync::Arc;

use toolrent_core::{
    ActorId, AggregateRoot, BorrowerId, BucketId, Clock, DomainError, DomainResult, ExpectedVersion, LoanId,
    SystemClock,
};
use toolrent_inventory::{KeyLocks, ToolState};

use crate::collaborators::{ConfigCollaborator, IdentityCollaborator, InventoryCollaborator};
use crate::collision::CollisionGuard;
use crate::fines::{FineCalculator, ReturnCondition};
use crate::loan::{Loan, LoanItem};
use crate::queries::LoanQueries;
use crate::request::{CreateLoan, PayFines, ReturnLoan, ValidatedLoan};
use crate::store::LoanStore;

/// Inventory moves made so far by one create/return call: (from, to).
type Committed = Vec<(BucketId, BucketId)>;

pub struct LoanLifecycleOrchestrator<L, I> {
    loans: L,
    inventory: I,
    identity: Arc<dyn IdentityCollaborator>,
    config: Arc<dyn ConfigCollaborator>,
    clock: Arc<dyn Clock>,
    loan_locks: KeyLocks<LoanId>,
}

impl<L, I> LoanLifecycleOrchestrator<L, I>
where
    L: LoanStore,
    I: InventoryCollaborator,
{
    pub fn new(
        loans: L,
        inventory: I,
        identity: Arc<dyn IdentityCollaborator>,
        config: Arc<dyn ConfigCollaborator>,
    ) -> Self {
        Self {
            loans,
            inventory,
            identity,
            config,
            clock: Arc::new(SystemClock),
            loan_locks: KeyLocks::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn queries(&self) -> LoanQueries<&L> {
        LoanQueries::new(&self.loans, self.clock.clone())
    }

    pub fn get_loan(&self, id: LoanId) -> DomainResult<Loan> {
        self.loans
            .get(id)?
            .ok_or_else(|| DomainError::not_found(format!("loan not found: {id}")))
    }

    pub fn create_loan(&self, request: CreateLoan) -> DomainResult<Loan> {
        let request = request.validate()?;
        let borrower = &request.borrower_id;

        if self.config.check_borrower_active() {
            match self.identity.borrower_active(borrower) {
                Ok(false) => {
                    return Err(DomainError::validation(
                        "borrower is inactive due to overdue loans or unpaid fines",
                    ));
                }
                Ok(true) => {}
                Err(e) => {
                    tracing::warn!(borrower = %borrower, error = %e, "borrower active check failed; not blocking");
                }
            }
        }

        let cap = self.config.max_open_loans();
        if self.loans.count_open(borrower)? >= cap {
            return Err(DomainError::validation(format!(
                "borrower already has {cap} active loans"
            )));
        }

        let total = FineCalculator::rent_total(
            request.reservation_date,
            request.due_date,
            self.config.daily_rent_rate(),
        );

        let mut committed = Committed::new();
        let created = self
            .reserve_items(&request, &mut committed)
            .and_then(|items| {
                Loan::open(
                    borrower.clone(),
                    request.reservation_date,
                    request.due_date,
                    total,
                    items,
                )
            })
            .and_then(|loan| self.loans.insert(loan));

        match created {
            Ok(loan) => {
                tracing::info!(
                    loan_id = %loan.id_typed(),
                    borrower = %borrower,
                    items = loan.amount_of_tools(),
                    total = loan.total(),
                    "loan created"
                );
                Ok(loan)
            }
            Err(e) => {
                report_partial("create", None, &committed, &e);
                Err(e)
            }
        }
    }

    fn reserve_items(&self, request: &ValidatedLoan, committed: &mut Committed) -> DomainResult<Vec<LoanItem>> {
        let borrower = &request.borrower_id;
        let actor = ActorId::from(borrower);
        let guard = CollisionGuard::new(&self.loans, &self.inventory);
        let mut items = Vec::with_capacity(request.tool_ids.len());

        for &tool_id in &request.tool_ids {
            let tool = self.inventory.get_tool(tool_id)?;
            if !tool.state.is_available() {
                return Err(DomainError::validation(format!(
                    "tool {tool_id} is not available (state: {})",
                    tool.state
                )));
            }
            if tool.amount < 1 {
                return Err(DomainError::validation(format!(
                    "not enough stock for tool {tool_id}; available: {}",
                    tool.amount
                )));
            }
            guard.check(borrower, &tool)?;

            let loaned = self
                .inventory
                .move_tool_state(tool_id, ToolState::Loaned, &actor)
                .map_err(|e| match e {
                    // Stock was there a moment ago; someone else took it.
                    DomainError::Validation(msg) => DomainError::conflict(format!(
                        "stock for tool {tool_id} changed during reservation: {msg}"
                    )),
                    other => other,
                })?;
            committed.push((tool_id, loaned.id));
            items.push(LoanItem::new(tool_id, tool.name, loaned.id));
        }
        Ok(items)
    }

    pub fn return_loan(&self, loan_id: LoanId, request: ReturnLoan) -> DomainResult<Loan> {
        let actual_return_date = request
            .actual_return_date
            .ok_or_else(|| DomainError::validation("actualReturnDate is required"))?;

        let _claim = self.loan_locks.lock(&[&loan_id])?;
        let mut loan = self.get_loan(loan_id)?;
        if !loan.is_open() {
            return Err(DomainError::validation(format!(
                "loan {loan_id} is already returned (closed)"
            )));
        }

        let both: BTreeSet<_> = request
            .damaged_tool_ids
            .intersection(&request.irreparable_tool_ids)
            .copied()
            .collect();
        if !both.is_empty() {
            return Err(DomainError::validation(format!(
                "a tool cannot be both damaged and irreparable: {}",
                join_ids(&both)
            )));
        }

        let own: BTreeSet<_> = loan.tool_ids().into_iter().collect();
        for (label, ids) in [
            ("damaged", &request.damaged_tool_ids),
            ("irreparable", &request.irreparable_tool_ids),
        ] {
            let unknown: BTreeSet<_> = ids.difference(&own).copied().collect();
            if !unknown.is_empty() {
                return Err(DomainError::validation(format!(
                    "{label} ids not in this loan: {}",
                    join_ids(&unknown)
                )));
            }
        }

        let mut committed = Committed::new();
        let closed = self
            .release_items(&loan, &request, &mut committed)
            .and_then(|damage_penalty| {
                let late_fine =
                    FineCalculator::late_fine(loan.due_date(), actual_return_date, request.fine_per_day());
                loan.close(actual_return_date, late_fine, damage_penalty)?;
                let expected = ExpectedVersion::Exact(loan.version());
                self.loans.save(loan.clone(), expected)
            });

        let loan = match closed {
            Ok(loan) => loan,
            Err(e) => {
                report_partial("return", Some(loan_id), &committed, &e);
                return Err(e);
            }
        };

        tracing::info!(
            loan_id = %loan_id,
            borrower = %loan.borrower_id(),
            late_fine = loan.late_fine(),
            damage_penalty = loan.damage_penalty(),
            "loan returned"
        );
        self.recompute_standing(loan.borrower_id());
        Ok(loan)
    }

    /// Moves every unit out of its loaned bucket; returns the damage penalty.
    fn release_items(&self, loan: &Loan, request: &ReturnLoan, committed: &mut Committed) -> DomainResult<i64> {
        let actor = ActorId::from(loan.borrower_id());
        let mut conditions = Vec::with_capacity(loan.items().len());

        for item in loan.items() {
            let condition = if request.irreparable_tool_ids.contains(&item.tool_id) {
                let live = self.inventory.get_tool(item.tool_id)?;
                ReturnCondition::Irreparable {
                    reposition_value: live.reposition_value,
                }
            } else if request.damaged_tool_ids.contains(&item.tool_id) {
                ReturnCondition::Damaged {
                    repair_cost: request.repair_cost(item.tool_id),
                }
            } else {
                ReturnCondition::Intact
            };

            let moved = self
                .inventory
                .move_tool_state(item.loaned_bucket_id, condition.target_state(), &actor)?;
            committed.push((item.loaned_bucket_id, moved.id));
            conditions.push(condition);
        }
        Ok(FineCalculator::damage_penalty(conditions))
    }

    /// Idempotent: paying an already-paid or zero fine is a no-op.
    pub fn pay_fines(&self, loan_id: LoanId, request: PayFines) -> DomainResult<Loan> {
        let _claim = self.loan_locks.lock(&[&loan_id])?;
        let mut loan = self.get_loan(loan_id)?;
        let changed = loan.pay(request.pay_late_fine, request.pay_damage_penalty);
        let expected = ExpectedVersion::Exact(loan.version());
        let loan = self.loans.save(loan, expected)?;

        if changed {
            tracing::info!(
                loan_id = %loan_id,
                late_fine_paid = loan.late_fine_paid(),
                damage_penalty_paid = loan.damage_penalty_paid(),
                "fines paid"
            );
        }
        self.recompute_standing(loan.borrower_id());
        Ok(loan)
    }

    fn recompute_standing(&self, borrower: &BorrowerId) {
        if !self.config.check_borrower_active() {
            return;
        }
        if let Err(e) = self.identity.recompute_borrower_active(borrower) {
            tracing::warn!(borrower = %borrower, error = %e, "borrower active recompute failed");
        }
    }
}

fn report_partial(operation: &str, loan_id: Option<LoanId>, committed: &Committed, error: &DomainError) {
    if committed.is_empty() {
        return;
    }
    let moves: Vec<String> = committed.iter().map(|(from, to)| format!("{from}->{to}")).collect();
    tracing::error!(
        operation,
        loan_id = ?loan_id,
        committed_moves = ?moves,
        error = %error,
        "loan {operation} aborted after inventory moves were committed; moves are not reversed"
    );
}

fn join_ids(ids: &BTreeSet<BucketId>) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
