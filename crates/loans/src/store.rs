use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use toolrent_core::{AggregateRoot, BorrowerId, BucketId, DomainError, DomainResult, ExpectedVersion, LoanId};

use crate::loan::Loan;

/// Persistence boundary for loans.
///
/// A loan and its items are written as one unit. Writes are
/// optimistic: `save` refuses a loan whose version moved since it was read.
pub trait LoanStore: Send + Sync {
    /// Persist a new loan; returns it at version 1.
    fn insert(&self, loan: Loan) -> DomainResult<Loan>;

    /// Replace an existing loan if the stored version matches `expected`.
    fn save(&self, loan: Loan, expected: ExpectedVersion) -> DomainResult<Loan>;

    fn get(&self, id: LoanId) -> DomainResult<Option<Loan>>;

    /// All loans in creation order.
    fn list(&self) -> DomainResult<Vec<Loan>>;

    fn count_open(&self, borrower: &BorrowerId) -> DomainResult<usize> {
        Ok(self
            .list()?
            .iter()
            .filter(|l| l.is_open() && l.borrower_id() == borrower)
            .count())
    }

    /// Whether any open loan of `borrower` has an item pointing at one of
    /// `bucket_ids`.
    fn open_loan_references_any(&self, borrower: &BorrowerId, bucket_ids: &[BucketId]) -> DomainResult<bool> {
        if bucket_ids.is_empty() {
            return Ok(false);
        }
        Ok(self
            .list()?
            .iter()
            .any(|l| l.is_open() && l.borrower_id() == borrower && l.references_any(bucket_ids)))
    }
}

impl<S> LoanStore for Arc<S>
where
    S: LoanStore + ?Sized,
{
    fn insert(&self, loan: Loan) -> DomainResult<Loan> {
        (**self).insert(loan)
    }

    fn save(&self, loan: Loan, expected: ExpectedVersion) -> DomainResult<Loan> {
        (**self).save(loan, expected)
    }

    fn get(&self, id: LoanId) -> DomainResult<Option<Loan>> {
        (**self).get(id)
    }

    fn list(&self) -> DomainResult<Vec<Loan>> {
        (**self).list()
    }

    fn count_open(&self, borrower: &BorrowerId) -> DomainResult<usize> {
        (**self).count_open(borrower)
    }

    fn open_loan_references_any(&self, borrower: &BorrowerId, bucket_ids: &[BucketId]) -> DomainResult<bool> {
        (**self).open_loan_references_any(borrower, bucket_ids)
    }
}

impl<S> LoanStore for &S
where
    S: LoanStore + ?Sized,
{
    fn insert(&self, loan: Loan) -> DomainResult<Loan> {
        (**self).insert(loan)
    }

    fn save(&self, loan: Loan, expected: ExpectedVersion) -> DomainResult<Loan> {
        (**self).save(loan, expected)
    }

    fn get(&self, id: LoanId) -> DomainResult<Option<Loan>> {
        (**self).get(id)
    }

    fn list(&self) -> DomainResult<Vec<Loan>> {
        (**self).list()
    }

    fn count_open(&self, borrower: &BorrowerId) -> DomainResult<usize> {
        (**self).count_open(borrower)
    }

    fn open_loan_references_any(&self, borrower: &BorrowerId, bucket_ids: &[BucketId]) -> DomainResult<bool> {
        (**self).open_loan_references_any(borrower, bucket_ids)
    }
}

/// In-memory loan table for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryLoanStore {
    // UUIDv7 ids sort by creation time.
    loans: RwLock<BTreeMap<LoanId, Loan>>,
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::unavailable("loan store lock poisoned")
}

impl LoanStore for InMemoryLoanStore {
    fn insert(&self, loan: Loan) -> DomainResult<Loan> {
        let mut loans = self.loans.write().map_err(|_| poisoned())?;
        if loans.contains_key(&loan.id_typed()) {
            return Err(DomainError::conflict(format!("loan {} already exists", loan.id_typed())));
        }
        ExpectedVersion::Exact(0).check(loan.version())?;
        let loan = loan.with_version(1);
        loans.insert(loan.id_typed(), loan.clone());
        Ok(loan)
    }

    fn save(&self, loan: Loan, expected: ExpectedVersion) -> DomainResult<Loan> {
        let mut loans = self.loans.write().map_err(|_| poisoned())?;
        let current = loans
            .get(&loan.id_typed())
            .ok_or_else(|| DomainError::not_found(format!("loan not found: {}", loan.id_typed())))?;
        expected.check(current.version())?;
        let loan = loan.with_version(current.version() + 1);
        loans.insert(loan.id_typed(), loan.clone());
        Ok(loan)
    }

    fn get(&self, id: LoanId) -> DomainResult<Option<Loan>> {
        let loans = self.loans.read().map_err(|_| poisoned())?;
        Ok(loans.get(&id).cloned())
    }

    fn list(&self) -> DomainResult<Vec<Loan>> {
        let loans = self.loans.read().map_err(|_| poisoned())?;
        Ok(loans.values().cloned().collect())
    }

    fn count_open(&self, borrower: &BorrowerId) -> DomainResult<usize> {
        let loans = self.loans.read().map_err(|_| poisoned())?;
        Ok(loans
            .values()
            .filter(|l| l.is_open() && l.borrower_id() == borrower)
            .count())
    }
}
