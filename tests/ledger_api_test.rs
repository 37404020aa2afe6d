mod common;

use axum::http::Method;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use common::{decimal, response_json, TestApp};

async fn create(app: &TestApp, payload: Value) -> Value {
    let response = app
        .request_authenticated(Method::POST, "/api/transactions", Some(payload))
        .await;
    assert_eq!(response.status(), 201);
    response_json(response).await["data"].clone()
}

#[tokio::test]
async fn transaction_lifecycle() {
    let app = TestApp::new().await;

    let sale = create(
        &app,
        json!({
            "date": "2024-03-10",
            "description": "ขายจานสี่เหลี่ยม",
            "category": "ขาย",
            "amount": 1500,
            "quantity": "300 จาน",
            "isIncome": true
        }),
    )
    .await;
    assert_eq!(sale["isIncome"], true);
    assert_eq!(sale["quantity"], "300 จาน");
    assert_eq!(decimal(&sale["amount"]), Decimal::from(1500));

    let id = sale["id"].as_str().unwrap();
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/transactions/{id}"),
            Some(json!({ "amount": 1600, "notes": "ลูกค้าประจำ" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated = response_json(response).await["data"].clone();
    assert_eq!(decimal(&updated["amount"]), Decimal::from(1600));
    assert_eq!(updated["notes"], "ลูกค้าประจำ");
    assert_eq!(updated["description"], "ขายจานสี่เหลี่ยม");

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/transactions/{id}"), None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Transaction deleted");

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/transactions/{id}"), None)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn list_filters_and_orders_newest_first() {
    let app = TestApp::new().await;
    create(
        &app,
        json!({ "date": "2024-03-01", "description": "ค่าไฟ", "category": "utilities", "amount": 200 }),
    )
    .await;
    create(
        &app,
        json!({ "date": "2024-03-05", "description": "ขาย", "category": "sales", "amount": 900, "isIncome": true }),
    )
    .await;
    create(
        &app,
        json!({ "date": "2024-04-01", "description": "ซื้อใบตอง", "category": "materials", "amount": 400 }),
    )
    .await;

    let response = app
        .request_authenticated(Method::GET, "/api/transactions", None)
        .await;
    let rows = response_json(response).await["data"].clone();
    let dates: Vec<_> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["date"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(dates, vec!["2024-04-01", "2024-03-05", "2024-03-01"]);

    let response = app
        .request_authenticated(
            Method::GET,
            "/api/transactions?from=2024-03-01&to=2024-03-31&isIncome=false",
            None,
        )
        .await;
    let rows = response_json(response).await["data"].clone();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["category"], "utilities");

    let response = app
        .request_authenticated(Method::GET, "/api/transactions?category=sales", None)
        .await;
    let rows = response_json(response).await["data"].clone();
    assert_eq!(rows.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn validation_rejects_blank_fields_and_negative_amounts() {
    let app = TestApp::new().await;

    for payload in [
        json!({ "description": "", "category": "x", "amount": 1 }),
        json!({ "description": "x", "category": "", "amount": 1 }),
        json!({ "description": "x", "category": "x", "amount": -5 }),
    ] {
        let response = app
            .request_authenticated(Method::POST, "/api/transactions", Some(payload))
            .await;
        assert_eq!(response.status(), 400);
    }

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/transactions/{}", uuid::Uuid::new_v4()),
            Some(json!({ "amount": 1 })),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn date_defaults_to_today() {
    let app = TestApp::new().await;
    let row = create(
        &app,
        json!({ "description": "ค่าแรง", "category": "labour", "amount": 300 }),
    )
    .await;
    assert_eq!(
        row["date"],
        chrono::Utc::now().date_naive().to_string()
    );
}
