use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use toolrent_core::{BorrowerId, DomainResult, LoanId};
use toolrent_loans::{CreateLoan, PayFines, ReturnLoan};

use crate::app::services::{AppServices, Queries};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_loan))
        .route("/active", get(list_active))
        .route("/overdue", get(list_overdue))
        .route("/debts", get(list_debts))
        .route("/exists/overdue", get(exists_overdue))
        .route("/exists/unpaid-late-fine", get(exists_unpaid_late_fine))
        .route("/exists/unpaid-damage", get(exists_unpaid_damage))
        .route("/:id", get(get_loan))
        .route("/:id/return", post(return_loan))
        .route("/:id/pay-fines", post(pay_fines))
}

pub async fn create_loan(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CreateLoan>,
) -> axum::response::Response {
    match errors::blocking(move || services.loans.create_loan(body)).await {
        Ok(loan) => (StatusCode::CREATED, Json(dto::LoanResponse::from(loan))).into_response(),
        Err(res) => res,
    }
}

pub async fn get_loan(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: LoanId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.loans.get_loan(id) {
        Ok(loan) => Json(dto::LoanResponse::from(loan)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn return_loan(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<ReturnLoan>,
) -> axum::response::Response {
    let id: LoanId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match errors::blocking(move || services.loans.return_loan(id, body)).await {
        Ok(loan) => Json(dto::LoanResponse::from(loan)).into_response(),
        Err(res) => res,
    }
}

/// A missing body pays nothing and just returns the loan.
pub async fn pay_fines(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Option<Json<PayFines>>,
) -> axum::response::Response {
    let id: LoanId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let request = body.map(|Json(b)| b).unwrap_or_default();

    match errors::blocking(move || services.loans.pay_fines(id, request)).await {
        Ok(loan) => Json(dto::LoanResponse::from(loan)).into_response(),
        Err(res) => res,
    }
}

/// Open loans, optionally for a single borrower.
pub async fn list_active(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::BorrowerQuery>,
) -> axum::response::Response {
    let queries = services.loans.queries();
    let result = query.borrower().and_then(|borrower| match borrower {
        Some(b) => queries.list_open(&b),
        None => queries.list_all_open(),
    });

    match result {
        Ok(loans) => Json(dto::loans(loans)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_overdue(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::BorrowerQuery>,
) -> axum::response::Response {
    let queries = services.loans.queries();
    let result = query
        .borrower()
        .and_then(|borrower| queries.list_overdue(borrower.as_ref()));

    match result {
        Ok(loans) => Json(dto::loans(loans)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_debts(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::DebtQuery>,
) -> axum::response::Response {
    let queries = services.loans.queries();
    let result = query
        .filter()
        .and_then(|filter| queries.list_with_unpaid_debts(&filter));

    match result {
        Ok(loans) => Json(dto::loans(loans)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn exists_overdue(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::BorrowerQuery>,
) -> axum::response::Response {
    exists(&services, &query, |q, b| q.has_overdue(b))
}

pub async fn exists_unpaid_late_fine(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::BorrowerQuery>,
) -> axum::response::Response {
    exists(&services, &query, |q, b| q.has_unpaid_late_fine(b))
}

pub async fn exists_unpaid_damage(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::BorrowerQuery>,
) -> axum::response::Response {
    exists(&services, &query, |q, b| q.has_unpaid_damage(b))
}

fn exists<F>(services: &AppServices, query: &dto::BorrowerQuery, check: F) -> axum::response::Response
where
    F: FnOnce(&Queries<'_>, &BorrowerId) -> DomainResult<bool>,
{
    let queries = services.loans.queries();
    let result = query.required().and_then(|borrower| check(&queries, &borrower));

    match result {
        Ok(found) => Json(found).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
