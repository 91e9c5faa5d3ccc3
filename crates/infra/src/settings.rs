use std::sync::atomic::{AtomicI64, Ordering};

use toolrent_core::{DomainError, DomainResult};
use toolrent_loans::{ConfigCollaborator, LoanSettings};

/// Settings service: the daily rent rate can change at runtime, the rest is
/// fixed at startup.
#[derive(Debug)]
pub struct RuntimeSettings {
    daily_rent_rate: AtomicI64,
    check_borrower_active: bool,
    max_open_loans: usize,
}

impl RuntimeSettings {
    pub fn new(initial: LoanSettings) -> DomainResult<Self> {
        let initial = initial.validate()?;
        Ok(Self {
            daily_rent_rate: AtomicI64::new(initial.daily_rent_rate),
            check_borrower_active: initial.check_borrower_active,
            max_open_loans: initial.max_open_loans,
        })
    }

    /// Replace the daily rate; negative values are rejected.
    pub fn set_daily_rent_rate(&self, value: i64) -> DomainResult<i64> {
        if value < 0 {
            return Err(DomainError::validation("daily rent rate cannot be negative"));
        }
        let previous = self.daily_rent_rate.swap(value, Ordering::SeqCst);
        tracing::info!(previous, current = value, "daily rent rate updated");
        Ok(value)
    }

    pub fn snapshot(&self) -> LoanSettings {
        LoanSettings {
            daily_rent_rate: self.daily_rent_rate(),
            check_borrower_active: self.check_borrower_active,
            max_open_loans: self.max_open_loans,
        }
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        let d = LoanSettings::default();
        Self {
            daily_rent_rate: AtomicI64::new(d.daily_rent_rate),
            check_borrower_active: d.check_borrower_active,
            max_open_loans: d.max_open_loans,
        }
    }
}

impl ConfigCollaborator for RuntimeSettings {
    fn daily_rent_rate(&self) -> i64 {
        self.daily_rent_rate.load(Ordering::SeqCst)
    }

    fn check_borrower_active(&self) -> bool {
        self.check_borrower_active
    }

    fn max_open_loans(&self) -> usize {
        self.max_open_loans
    }
}
