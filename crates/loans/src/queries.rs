//! Read side over the loan store: listings and borrower standing.
//!
//! Reads take no locks and may trail concurrent writers.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use toolrent_core::{BorrowerId, Clock, DomainResult};

use crate::collaborators::{BorrowerStanding, StandingSource};
use crate::loan::Loan;
use crate::store::LoanStore;

/// Filter for loans with outstanding fines. Date bounds apply to the
/// reservation date and are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtFilter {
    pub borrower: Option<BorrowerId>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DebtFilter {
    fn matches(&self, loan: &Loan) -> bool {
        loan.has_unpaid_debt()
            && self.borrower.as_ref().is_none_or(|b| loan.borrower_id() == b)
            && self.start.is_none_or(|s| loan.reservation_date() >= s)
            && self.end.is_none_or(|e| loan.reservation_date() <= e)
    }
}

pub struct LoanQueries<L> {
    store: L,
    clock: Arc<dyn Clock>,
}

impl<L: LoanStore> LoanQueries<L> {
    pub fn new(store: L, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn select(&self, keep: impl Fn(&Loan) -> bool) -> DomainResult<Vec<Loan>> {
        Ok(self.store.list()?.into_iter().filter(|l| keep(l)).collect())
    }

    pub fn list_by_borrower(&self, borrower: &BorrowerId) -> DomainResult<Vec<Loan>> {
        self.select(|l| l.borrower_id() == borrower)
    }

    pub fn list_open(&self, borrower: &BorrowerId) -> DomainResult<Vec<Loan>> {
        self.select(|l| l.is_open() && l.borrower_id() == borrower)
    }

    pub fn list_all_open(&self) -> DomainResult<Vec<Loan>> {
        self.select(Loan::is_open)
    }

    /// Open loans due before today, optionally for one borrower.
    pub fn list_overdue(&self, borrower: Option<&BorrowerId>) -> DomainResult<Vec<Loan>> {
        let today = self.today();
        self.select(|l| l.is_overdue(today) && borrower.is_none_or(|b| l.borrower_id() == b))
    }

    pub fn list_with_unpaid_debts(&self, filter: &DebtFilter) -> DomainResult<Vec<Loan>> {
        self.select(|l| filter.matches(l))
    }

    pub fn has_overdue(&self, borrower: &BorrowerId) -> DomainResult<bool> {
        let today = self.today();
        Ok(self
            .store
            .list()?
            .iter()
            .any(|l| l.borrower_id() == borrower && l.is_overdue(today)))
    }

    pub fn has_unpaid_late_fine(&self, borrower: &BorrowerId) -> DomainResult<bool> {
        Ok(self
            .store
            .list()?
            .iter()
            .any(|l| l.borrower_id() == borrower && l.has_unpaid_late_fine()))
    }

    pub fn has_unpaid_damage(&self, borrower: &BorrowerId) -> DomainResult<bool> {
        Ok(self
            .store
            .list()?
            .iter()
            .any(|l| l.borrower_id() == borrower && l.has_unpaid_damage()))
    }

    pub fn borrower_standing(&self, borrower: &BorrowerId) -> DomainResult<BorrowerStanding> {
        let today = self.today();
        let mut standing = BorrowerStanding::default();
        for loan in self.store.list()?.iter().filter(|l| l.borrower_id() == borrower) {
            standing.has_overdue |= loan.is_overdue(today);
            standing.has_unpaid_late_fine |= loan.has_unpaid_late_fine();
            standing.has_unpaid_damage |= loan.has_unpaid_damage();
        }
        Ok(standing)
    }
}

impl<L: LoanStore> StandingSource for LoanQueries<L> {
    fn standing(&self, borrower: &BorrowerId) -> DomainResult<BorrowerStanding> {
        self.borrower_standing(borrower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::LoanItem;
    use crate::store::InMemoryLoanStore;
    use toolrent_core::{BucketId, ExpectedVersion, FixedClock};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn who(raw: &str) -> BorrowerId {
        BorrowerId::parse(raw).unwrap()
    }

    fn seed(store: &InMemoryLoanStore, borrower: &str, reserved: u32, due: u32) -> Loan {
        let item = LoanItem::new(BucketId::new(), "Level", BucketId::new());
        store
            .insert(Loan::open(who(borrower), day(reserved), day(due), 2500, vec![item]).unwrap())
            .unwrap()
    }

    fn queries(store: &Arc<InMemoryLoanStore>, today: u32) -> LoanQueries<Arc<InMemoryLoanStore>> {
        LoanQueries::new(store.clone(), Arc::new(FixedClock(day(today))))
    }

    #[test]
    fn overdue_means_open_and_due_before_today() {
        let store = Arc::new(InMemoryLoanStore::new());
        let late = seed(&store, "a", 1, 5);
        seed(&store, "a", 1, 10);
        seed(&store, "b", 1, 3);

        let q = queries(&store, 10);
        let ids: Vec<_> = q.list_overdue(Some(&who("a"))).unwrap().iter().map(Loan::id_typed).collect();
        assert_eq!(ids, vec![late.id_typed()]);
        assert_eq!(q.list_overdue(None).unwrap().len(), 2);
        assert!(q.has_overdue(&who("b")).unwrap());
    }

    #[test]
    fn debts_filter_by_borrower_and_reservation_range() {
        let store = Arc::new(InMemoryLoanStore::new());
        let mut early = seed(&store, "a", 1, 2);
        let mut later = seed(&store, "a", 10, 12);
        seed(&store, "a", 11, 12);

        early.close(day(4), 1000, 0).unwrap();
        store.save(early.clone(), ExpectedVersion::Exact(1)).unwrap();
        later.close(day(12), 0, 500).unwrap();
        store.save(later.clone(), ExpectedVersion::Exact(1)).unwrap();

        let q = queries(&store, 20);
        assert_eq!(q.list_with_unpaid_debts(&DebtFilter::default()).unwrap().len(), 2);

        let ranged = DebtFilter { start: Some(day(5)), ..DebtFilter::default() };
        let got = q.list_with_unpaid_debts(&ranged).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id_typed(), later.id_typed());

        let other = DebtFilter { borrower: Some(who("z")), ..DebtFilter::default() };
        assert!(q.list_with_unpaid_debts(&other).unwrap().is_empty());
    }

    #[test]
    fn standing_combines_all_checks() {
        let store = Arc::new(InMemoryLoanStore::new());
        let mut loan = seed(&store, "a", 1, 2);
        let q = queries(&store, 2);
        assert!(q.standing(&who("a")).unwrap().is_active());

        loan.close(day(3), 0, 700).unwrap();
        store.save(loan, ExpectedVersion::Exact(1)).unwrap();
        let standing = q.standing(&who("a")).unwrap();
        assert!(standing.has_unpaid_damage);
        assert!(!standing.has_unpaid_late_fine);
        assert!(!standing.is_active());
        assert!(q.has_unpaid_damage(&who("a")).unwrap());
        assert!(!q.has_unpaid_late_fine(&who("a")).unwrap());
    }
}
