use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use toolrent_core::{BorrowerId, BucketId, DomainResult};
use toolrent_inventory::{Bucket, EditAttributes, RegisterStock, ToolState};
use toolrent_loans::{DebtFilter, Loan, LoanStatus};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterToolRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub state: Option<String>,
    pub amount: i64,
    pub reposition_value: i64,
}

impl RegisterToolRequest {
    /// State defaults to `Available` when omitted.
    pub fn into_command(self) -> DomainResult<RegisterStock> {
        let state = match self.state.as_deref() {
            Some(raw) => ToolState::parse(raw)?,
            None => ToolState::Available,
        };
        Ok(RegisterStock {
            name: self.name,
            category: self.category,
            state,
            amount: self.amount,
            reposition_value: self.reposition_value,
        })
    }
}

/// `state` present: move one unit. Otherwise: overwrite attributes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateToolRequest {
    pub state: Option<String>,
    pub amount: Option<i64>,
    pub reposition_value: Option<i64>,
}

impl UpdateToolRequest {
    pub fn attributes(&self) -> EditAttributes {
        EditAttributes {
            amount: self.amount,
            reposition_value: self.reposition_value,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StateQuery {
    pub state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TripleQuery {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct BorrowerQuery {
    pub borrower: Option<String>,
}

impl BorrowerQuery {
    /// Blank means "no filter".
    pub fn borrower(&self) -> DomainResult<Option<BorrowerId>> {
        match self.borrower.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => BorrowerId::parse(raw).map(Some),
        }
    }

    pub fn required(&self) -> DomainResult<BorrowerId> {
        BorrowerId::parse(self.borrower.as_deref().unwrap_or_default())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DebtQuery {
    pub borrower: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DebtQuery {
    pub fn filter(&self) -> DomainResult<DebtFilter> {
        let borrower = BorrowerQuery {
            borrower: self.borrower.clone(),
        }
        .borrower()?;
        Ok(DebtFilter {
            borrower,
            start: self.start,
            end: self.end,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub value: i64,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub id: BucketId,
    pub name: String,
    pub category: String,
    pub state: ToolState,
    pub amount: i64,
    pub reposition_value: i64,
    pub available: bool,
}

impl From<Bucket> for ToolResponse {
    fn from(b: Bucket) -> Self {
        Self {
            id: b.id_typed(),
            available: b.is_available(),
            state: b.state(),
            amount: b.amount(),
            reposition_value: b.reposition_value(),
            name: b.name().to_string(),
            category: b.category().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoanResponse {
    #[serde(flatten)]
    pub loan: Loan,
    pub status: LoanStatus,
    #[serde(rename = "amountOfTools")]
    pub amount_of_tools: usize,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            status: loan.status(),
            amount_of_tools: loan.amount_of_tools(),
            loan,
        }
    }
}

pub fn tools(buckets: Vec<Bucket>) -> Vec<ToolResponse> {
    buckets.into_iter().map(ToolResponse::from).collect()
}

pub fn loans(loans: Vec<Loan>) -> Vec<LoanResponse> {
    loans.into_iter().map(LoanResponse::from).collect()
}
