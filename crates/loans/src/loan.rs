use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use toolrent_core::{AggregateRoot, BorrowerId, BucketId, DomainError, DomainResult, LoanId, LoanItemId};

/// Loan lifecycle. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Open,
    Closed,
}

/// One borrowed unit.
///
/// `tool_id` is the bucket the unit was requested from (and the id callers use
/// when reporting damage); `loaned_bucket_id` is the bucket the unit sits in
/// while the loan is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanItem {
    pub id: LoanItemId,
    pub tool_id: BucketId,
    pub tool_name_snapshot: String,
    pub loaned_bucket_id: BucketId,
}

impl LoanItem {
    pub fn new(tool_id: BucketId, tool_name_snapshot: impl Into<String>, loaned_bucket_id: BucketId) -> Self {
        Self {
            id: LoanItemId::new(),
            tool_id,
            tool_name_snapshot: tool_name_snapshot.into(),
            loaned_bucket_id,
        }
    }

    /// Whether this line points at any of `bucket_ids`.
    pub fn references_any(&self, bucket_ids: &[BucketId]) -> bool {
        bucket_ids.contains(&self.tool_id) || bucket_ids.contains(&self.loaned_bucket_id)
    }
}

/// Aggregate root: Loan.
///
/// Persisted together with its items as one unit. Amounts are integers in the
/// smallest currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    id: LoanId,
    borrower_id: BorrowerId,
    reservation_date: NaiveDate,
    due_date: NaiveDate,
    actual_return_date: Option<NaiveDate>,
    total: i64,
    late_fine: i64,
    damage_penalty: i64,
    late_fine_paid: bool,
    damage_penalty_paid: bool,
    items: Vec<LoanItem>,
    version: u64,
}

impl Loan {
    /// Build a new open loan (not yet persisted, version 0).
    pub fn open(
        borrower_id: BorrowerId,
        reservation_date: NaiveDate,
        due_date: NaiveDate,
        total: i64,
        items: Vec<LoanItem>,
    ) -> DomainResult<Self> {
        if due_date < reservation_date {
            return Err(DomainError::validation("due date cannot be before reservation date"));
        }
        if items.is_empty() {
            return Err(DomainError::validation("at least one item is required"));
        }
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.tool_id) {
                return Err(DomainError::validation(format!(
                    "tool repeated in the same loan: {}",
                    item.tool_id
                )));
            }
        }

        Ok(Self {
            id: LoanId::new(),
            borrower_id,
            reservation_date,
            due_date,
            actual_return_date: None,
            total,
            late_fine: 0,
            damage_penalty: 0,
            late_fine_paid: false,
            damage_penalty_paid: false,
            items,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> LoanId {
        self.id
    }

    pub fn borrower_id(&self) -> &BorrowerId {
        &self.borrower_id
    }

    pub fn reservation_date(&self) -> NaiveDate {
        self.reservation_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn actual_return_date(&self) -> Option<NaiveDate> {
        self.actual_return_date
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn late_fine(&self) -> i64 {
        self.late_fine
    }

    pub fn damage_penalty(&self) -> i64 {
        self.damage_penalty
    }

    pub fn late_fine_paid(&self) -> bool {
        self.late_fine_paid
    }

    pub fn damage_penalty_paid(&self) -> bool {
        self.damage_penalty_paid
    }

    pub fn items(&self) -> &[LoanItem] {
        &self.items
    }

    pub fn amount_of_tools(&self) -> usize {
        self.items.len()
    }

    pub fn status(&self) -> LoanStatus {
        if self.actual_return_date.is_none() {
            LoanStatus::Open
        } else {
            LoanStatus::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.status() == LoanStatus::Open
    }

    pub fn tool_ids(&self) -> Vec<BucketId> {
        self.items.iter().map(|i| i.tool_id).collect()
    }

    pub fn references_any(&self, bucket_ids: &[BucketId]) -> bool {
        self.items.iter().any(|i| i.references_any(bucket_ids))
    }

    /// Open and past its due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_open() && self.due_date < today
    }

    pub fn has_unpaid_late_fine(&self) -> bool {
        self.late_fine > 0 && !self.late_fine_paid
    }

    pub fn has_unpaid_damage(&self) -> bool {
        self.damage_penalty > 0 && !self.damage_penalty_paid
    }

    pub fn has_unpaid_debt(&self) -> bool {
        self.has_unpaid_late_fine() || self.has_unpaid_damage()
    }

    /// Record the return: Open -> Closed, once.
    pub fn close(
        &mut self,
        actual_return_date: NaiveDate,
        late_fine: i64,
        damage_penalty: i64,
    ) -> DomainResult<()> {
        if !self.is_open() {
            return Err(DomainError::validation(format!(
                "loan {} is already returned (closed)",
                self.id
            )));
        }
        self.actual_return_date = Some(actual_return_date);
        self.late_fine = late_fine.max(0);
        self.damage_penalty = damage_penalty.max(0);
        if self.late_fine > 0 {
            self.late_fine_paid = false;
        }
        if self.damage_penalty > 0 {
            self.damage_penalty_paid = false;
        }
        Ok(())
    }

    /// Mark requested fines as paid. Only amounts > 0 can be paid; flags never
    /// revert. Returns whether anything changed.
    pub fn pay(&mut self, late_fine: bool, damage_penalty: bool) -> bool {
        let mut changed = false;
        if late_fine && self.late_fine > 0 && !self.late_fine_paid {
            self.late_fine_paid = true;
            changed = true;
        }
        if damage_penalty && self.damage_penalty > 0 && !self.damage_penalty_paid {
            self.damage_penalty_paid = true;
            changed = true;
        }
        changed
    }

    /// Stamp the version a store assigned on write.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }
}

impl AggregateRoot for Loan {
    type Id = LoanId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
