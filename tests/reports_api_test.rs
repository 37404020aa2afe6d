mod common;

use axum::http::{header, Method};
use rust_decimal::Decimal;
use serde_json::json;

use common::{decimal, response_json, response_text, TestApp};

async fn seed(app: &TestApp) {
    app.add_material("ใบตองตึง", 100, 2).await;
    app.add_material("แป้งข้าวเหนียว", 50, 10).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/orders",
            Some(json!({
                "lot": "L-1",
                "date": "2024-03-02",
                "product": "จานสี่เหลี่ยม",
                "orderedQuantity": 10,
                "sellingPrice": 500,
                "electricityCost": 20
            })),
        )
        .await;
    let order = response_json(response).await["data"].clone();
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/orders/production",
            Some(json!({ "orderId": order["id"], "producedQuantity": 10 })),
        )
        .await;
    assert_eq!(response.status(), 200);

    for (description, amount, income, date) in [
        ("ขาย, ส่งตลาด", 1000, true, "2024-03-05"),
        ("ค่าไฟ \"มีนาคม\"", 300, false, "2024-03-06"),
        ("ขายเดือนก่อน", 700, true, "2024-02-01"),
    ] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/transactions",
                Some(json!({
                    "date": date,
                    "description": description,
                    "category": "general",
                    "amount": amount,
                    "isIncome": income
                })),
            )
            .await;
        assert_eq!(response.status(), 201);
    }
}

#[tokio::test]
async fn summary_totals_for_a_period() {
    let app = TestApp::new().await;
    seed(&app).await;

    let response = app
        .request_authenticated(
            Method::GET,
            "/api/reports/summary?from=2024-03-01&to=2024-03-31&low_stock_threshold=40",
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let summary = response_json(response).await["data"].clone();

    assert_eq!(decimal(&summary["incomeTotal"]), Decimal::from(1000));
    assert_eq!(decimal(&summary["expenseTotal"]), Decimal::from(300));
    assert_eq!(decimal(&summary["net"]), Decimal::from(700));
    assert_eq!(summary["orderCount"], 1);
    assert_eq!(summary["producedOrderCount"], 1);
    assert_eq!(summary["platesProduced"], 10);
    assert_eq!(decimal(&summary["materialCostTotal"]), Decimal::from(280));
    assert_eq!(decimal(&summary["productionCostTotal"]), Decimal::from(300));
    assert_eq!(decimal(&summary["salesTotal"]), Decimal::from(500));
    // 60 leaves at 2 + 30 flour at 10
    assert_eq!(decimal(&summary["inventoryValue"]), Decimal::from(420));
    assert_eq!(summary["materialCount"], 2);
    assert_eq!(summary["lowStockCount"], 1);
}

#[tokio::test]
async fn summary_rejects_an_inverted_period() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(
            Method::GET,
            "/api/reports/summary?from=2024-04-01&to=2024-03-01",
            None,
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn transactions_export_is_a_quoted_csv_download() {
    let app = TestApp::new().await;
    seed(&app).await;

    let response = app
        .request_authenticated(
            Method::GET,
            "/api/reports/export/transactions?from=2024-03-01",
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(disposition, "attachment; filename=\"transactions.csv\"");

    let csv = response_text(response).await;
    let csv = csv.strip_prefix('\u{feff}').expect("utf-8 bom");
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "date,description,category,amount,quantity,type,notes"
    );
    assert_eq!(lines.len(), 3);
    assert!(csv.contains("\"ขาย, ส่งตลาด\""));
    assert!(csv.contains("\"ค่าไฟ \"\"มีนาคม\"\"\""));
    assert!(csv.contains("รายรับ"));
    assert!(csv.contains("รายจ่าย"));
    assert!(!csv.contains("ขายเดือนก่อน"));
}

#[tokio::test]
async fn materials_and_orders_exports() {
    let app = TestApp::new().await;
    seed(&app).await;

    let response = app
        .request_authenticated(Method::GET, "/api/reports/export/materials", None)
        .await;
    assert_eq!(response.status(), 200);
    let csv = response_text(response).await;
    assert!(csv.contains("ใบตองตึง,60,ใบ,2,120,"));

    let response = app
        .request_authenticated(Method::GET, "/api/reports/export/orders", None)
        .await;
    let csv = response_text(response).await;
    assert!(csv.contains("L-1,2024-03-02,จานสี่เหลี่ยม,10 จาน,10 จาน"));

    let response = app
        .request_authenticated(Method::GET, "/api/reports/export/material-history", None)
        .await;
    let csv = response_text(response).await;
    assert!(csv.contains("นำไปใช้"));
    assert!(csv.contains("lot L-1"));
}

async fn export_orders(app: &TestApp, query: &str) -> String {
    let uri = format!("/api/reports/export/orders{query}");
    let response = app.request_authenticated(Method::GET, &uri, None).await;
    assert_eq!(response.status(), 200);
    response_text(response).await
}

#[tokio::test]
async fn dated_exports_apply_inclusive_bounds() {
    let app = TestApp::new().await;
    seed(&app).await;

    let on_the_day = export_orders(&app, "?from=2024-03-02&to=2024-03-02").await;
    assert!(on_the_day.contains("L-1,2024-03-02"));

    let after = export_orders(&app, "?from=2024-03-03").await;
    assert_eq!(after.lines().count(), 1, "header only: {after}");

    let before = export_orders(&app, "?to=2024-03-01").await;
    assert!(!before.contains("L-1"));

    let response = app
        .request_authenticated(
            Method::GET,
            "/api/reports/summary?from=2024-02-01&to=2024-02-29",
            None,
        )
        .await;
    let summary = response_json(response).await["data"].clone();
    assert_eq!(summary["orderCount"], 0);
    assert_eq!(decimal(&summary["incomeTotal"]), Decimal::from(700));
    assert_eq!(decimal(&summary["expenseTotal"]), Decimal::ZERO);
}

#[tokio::test]
async fn unknown_dataset_is_404() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(Method::GET, "/api/reports/export/users", None)
        .await;
    assert_eq!(response.status(), 404);
}
