use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde_json::{json, Value};

use toolrent_api::app::{self, services::AppServices};
use toolrent_core::FixedClock;
use toolrent_loans::LoanSettings;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, pinned clock, ephemeral port.
        let today = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let services = AppServices::in_memory_with_clock(LoanSettings::default(), Arc::new(FixedClock(today)))
            .expect("valid settings");
        let app = app::build_app(Arc::new(services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn register_hammers(client: &reqwest::Client, server: &TestServer, amount: i64) -> Value {
    let res = client
        .post(server.url("/tool"))
        .header("x-actor", "clerk-1")
        .json(&json!({
            "name": "Hammer",
            "category": "Manual",
            "amount": amount,
            "repositionValue": 12000,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn open_loan(client: &reqwest::Client, server: &TestServer, tool_id: &str) -> reqwest::Response {
    client
        .post(server.url("/loan"))
        .json(&json!({
            "borrowerId": "11-1",
            "reservationDate": "2025-03-18",
            "dueDate": "2025-03-20",
            "items": [{ "toolId": tool_id }],
        }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn().await;
    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn blank_actor_header_is_rejected() {
    let server = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .get(server.url("/tool"))
        .header("x-actor", "  ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_and_move_tool() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let tool = register_hammers(&client, &server, 3).await;
    assert_eq!(tool["amount"], 3);
    assert_eq!(tool["state"], "Available");
    assert_eq!(tool["available"], true);
    let id = tool["id"].as_str().unwrap().to_string();

    // Registering the same type again merges into the bucket.
    let merged = register_hammers(&client, &server, 2).await;
    assert_eq!(merged["id"], id.as_str());
    assert_eq!(merged["amount"], 5);

    let res = client
        .put(server.url(&format!("/tool/{id}")))
        .json(&json!({ "state": "In-repair" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let repair: Value = res.json().await.unwrap();
    assert_eq!(repair["state"], "In-repair");
    assert_eq!(repair["amount"], 1);
    assert_ne!(repair["id"], id.as_str());

    let source: Value = client
        .get(server.url(&format!("/tool/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(source["amount"], 4);

    let ids: Vec<String> = client
        .get(server.url("/tool/ids?name=hammer&category=manual&state=In-repair"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ids, vec![repair["id"].as_str().unwrap().to_string()]);

    let res = client
        .put(server.url(&format!("/tool/{id}")))
        .json(&json!({ "state": "Broken" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tool_lookup_errors() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/tool/not-a-uuid")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(server.url("/tool/0190f5d2-7c1e-7a3b-9c1d-2b3c4d5e6f70"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn loan_lifecycle_over_http() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let tool = register_hammers(&client, &server, 3).await;
    let tool_id = tool["id"].as_str().unwrap().to_string();

    let res = open_loan(&client, &server, &tool_id).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let loan: Value = res.json().await.unwrap();
    assert_eq!(loan["status"], "open");
    assert_eq!(loan["total"], 5000);
    assert_eq!(loan["amountOfTools"], 1);
    let loan_id = loan["id"].as_str().unwrap().to_string();

    let stock: Value = client
        .get(server.url(&format!("/tool/{tool_id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stock["amount"], 2);

    // Same item type twice for one borrower.
    let res = open_loan(&client, &server, &tool_id).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("Hammer - Manual"));

    let active: Vec<Value> = client
        .get(server.url("/loan/active?borrower=11-1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(active.len(), 1);

    let res = client
        .post(server.url(&format!("/loan/{loan_id}/return")))
        .json(&json!({ "actualReturnDate": "2025-03-22", "finePerDay": 500 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let closed: Value = res.json().await.unwrap();
    assert_eq!(closed["status"], "closed");
    assert_eq!(closed["lateFine"], 1000);
    assert_eq!(closed["lateFinePaid"], false);

    let stock: Value = client
        .get(server.url(&format!("/tool/{tool_id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stock["amount"], 3);

    let res = client
        .post(server.url(&format!("/loan/{loan_id}/return")))
        .json(&json!({ "actualReturnDate": "2025-03-22" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let owes: bool = client
        .get(server.url("/loan/exists/unpaid-late-fine?borrower=11-1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(owes);

    let debts: Vec<Value> = client
        .get(server.url("/loan/debts?borrower=11-1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(debts.len(), 1);

    let paid: Value = client
        .post(server.url(&format!("/loan/{loan_id}/pay-fines")))
        .json(&json!({ "payLateFine": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(paid["lateFinePaid"], true);

    let owes: bool = client
        .get(server.url("/loan/exists/unpaid-late-fine?borrower=11-1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!owes);
}

#[tokio::test]
async fn loan_lookup_errors() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/loan/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(server.url("/loan/0190f5d2-7c1e-7a3b-9c1d-2b3c4d5e6f70"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(server.url("/loan/exists/overdue"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn daily_rent_rate_is_adjustable() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let current: Value = client
        .get(server.url("/settings/daily-rent-rate"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["value"], 2500);

    let res = client
        .put(server.url("/settings/daily-rent-rate"))
        .json(&json!({ "value": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(server.url("/settings/daily-rent-rate"))
        .json(&json!({ "value": 3000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // New loans are priced with the new rate.
    let tool = register_hammers(&client, &server, 1).await;
    let loan: Value = open_loan(&client, &server, tool["id"].as_str().unwrap())
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(loan["total"], 6000);
}
