//! Structured request bodies for loan operations.
//!
//! Optional fields carry documented defaults: `quantity` is 1, `finePerDay`
//! is 0, missing id sets and cost maps are empty, pay flags are false.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use toolrent_core::{BorrowerId, BucketId, DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanItemRequest {
    pub tool_id: Option<BucketId>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl LoanItemRequest {
    pub fn one(tool_id: BucketId) -> Self {
        Self { tool_id: Some(tool_id), quantity: None }
    }

    pub fn quantity(&self) -> i64 {
        self.quantity.unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoan {
    #[serde(default)]
    pub borrower_id: String,
    pub reservation_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<LoanItemRequest>,
}

/// A create request that passed input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLoan {
    pub borrower_id: BorrowerId,
    pub reservation_date: NaiveDate,
    pub due_date: NaiveDate,
    pub tool_ids: Vec<BucketId>,
}

impl CreateLoan {
    pub fn validate(&self) -> DomainResult<ValidatedLoan> {
        let (Some(reservation_date), Some(due_date)) = (self.reservation_date, self.due_date) else {
            return Err(DomainError::validation("reservation and due dates are required"));
        };
        if due_date < reservation_date {
            return Err(DomainError::validation("due date cannot be before reservation date"));
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("at least one item is required"));
        }
        let borrower_id = BorrowerId::parse(&self.borrower_id)?;

        let mut seen = HashSet::new();
        let mut tool_ids = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let tool_id = item
                .tool_id
                .ok_or_else(|| DomainError::validation("each item requires 'toolId'"))?;
            if !seen.insert(tool_id) {
                return Err(DomainError::validation(format!(
                    "tool repeated in the same loan: {tool_id}"
                )));
            }
            let quantity = item.quantity();
            if quantity <= 0 {
                return Err(DomainError::validation("quantity must be >= 1"));
            }
            if quantity != 1 {
                return Err(DomainError::validation("only one unit per tool is allowed"));
            }
            tool_ids.push(tool_id);
        }

        Ok(ValidatedLoan {
            borrower_id,
            reservation_date,
            due_date,
            tool_ids,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLoan {
    pub actual_return_date: Option<NaiveDate>,
    #[serde(default, alias = "damaged")]
    pub damaged_tool_ids: BTreeSet<BucketId>,
    #[serde(default, alias = "irreparable")]
    pub irreparable_tool_ids: BTreeSet<BucketId>,
    #[serde(default)]
    pub fine_per_day: Option<i64>,
    #[serde(default, alias = "damagedCosts")]
    pub repair_costs: BTreeMap<BucketId, i64>,
}

impl ReturnLoan {
    pub fn fine_per_day(&self) -> i64 {
        self.fine_per_day.unwrap_or(0).max(0)
    }

    pub fn repair_cost(&self, tool_id: BucketId) -> i64 {
        self.repair_costs.get(&tool_id).copied().unwrap_or(0).max(0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayFines {
    #[serde(default)]
    pub pay_late_fine: bool,
    #[serde(default)]
    pub pay_damage_penalty: bool,
}
