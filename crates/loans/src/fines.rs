//! Rent and fine arithmetic.
//!
//! Day counts are calendar days between two dates (`b - a`), so a loan
//! reserved and due on the same day spans 0 days.

use chrono::NaiveDate;

use toolrent_inventory::ToolState;

/// Condition a unit came back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCondition {
    Intact,
    Damaged { repair_cost: i64 },
    Irreparable { reposition_value: i64 },
}

impl ReturnCondition {
    /// Amount this unit adds to the damage penalty (never negative).
    pub fn penalty(self) -> i64 {
        match self {
            ReturnCondition::Intact => 0,
            ReturnCondition::Damaged { repair_cost } => repair_cost.max(0),
            ReturnCondition::Irreparable { reposition_value } => reposition_value.max(0),
        }
    }

    /// State the unit moves to on return.
    pub fn target_state(self) -> ToolState {
        match self {
            ReturnCondition::Intact => ToolState::Available,
            ReturnCondition::Damaged { .. } => ToolState::InRepair,
            ReturnCondition::Irreparable { .. } => ToolState::Disposed,
        }
    }
}

/// Stateless fine calculator.
#[derive(Debug, Default, Clone, Copy)]
pub struct FineCalculator;

impl FineCalculator {
    pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
        (to - from).num_days()
    }

    /// Rent for the loan period; at least one day is billed.
    pub fn rent_total(reservation_date: NaiveDate, due_date: NaiveDate, daily_rate: i64) -> i64 {
        Self::days_between(reservation_date, due_date)
            .max(1)
            .saturating_mul(daily_rate)
    }

    pub fn late_days(due_date: NaiveDate, actual_return_date: NaiveDate) -> i64 {
        Self::days_between(due_date, actual_return_date).max(0)
    }

    /// Fine for days past due. A negative rate counts as 0.
    pub fn late_fine(due_date: NaiveDate, actual_return_date: NaiveDate, per_day: i64) -> i64 {
        Self::late_days(due_date, actual_return_date).saturating_mul(per_day.max(0))
    }

    pub fn damage_penalty<I>(conditions: I) -> i64
    where
        I: IntoIterator<Item = ReturnCondition>,
    {
        conditions
            .into_iter()
            .map(ReturnCondition::penalty)
            .fold(0i64, i64::saturating_add)
    }
}
