mod common;

use axum::http::Method;
use rust_decimal::Decimal;
use serde_json::json;

use common::{decimal, response_json, TestApp};

#[tokio::test]
async fn adding_twice_increments_and_logs_each_addition() {
    let app = TestApp::new().await;

    let first = app.add_material("ใบตองตึง", 100, 2).await;
    assert_eq!(first["name"], "ใบตองตึง");
    assert_eq!(decimal(&first["quantity"]), Decimal::from(100));
    assert_eq!(first["unit"], "ใบ");

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/materials",
            Some(json!({ "name": "ใบตองตึง", "quantity": 50 })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let second = response_json(response).await["data"].clone();
    assert_eq!(second["id"], first["id"]);
    assert_eq!(decimal(&second["quantity"]), Decimal::from(150));
    assert_eq!(second["unit"], "ใบ");

    let history = app.history_of("ใบตองตึง").await;
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|row| row["action"] == "เพิ่ม"));
    let logged: Decimal = history.iter().map(|row| decimal(&row["quantity"])).sum();
    assert_eq!(logged, Decimal::from(150));
}

#[tokio::test]
async fn adding_zero_registers_without_history() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/materials",
            Some(json!({ "name": "กาว", "quantity": 0, "unit": "ขวด", "pricePerUnit": 35 })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let created = response_json(response).await["data"].clone();
    assert_eq!(created["unit"], "ขวด");
    assert_eq!(decimal(&created["quantity"]), Decimal::ZERO);
    assert!(app.history_of("กาว").await.is_empty());

    app.add_material("กาว", 4, 35).await;
    let history = app.history_of("กาว").await;
    assert_eq!(history.len(), 1);
    assert_eq!(decimal(&history[0]["quantity"]), Decimal::from(4));
}

#[tokio::test]
async fn list_is_sorted_by_name() {
    let app = TestApp::new().await;
    app.add_material("b-material", 1, 1).await;
    app.add_material("a-material", 1, 1).await;

    let response = app
        .request_authenticated(Method::GET, "/api/materials", None)
        .await;
    let body = response_json(response).await;
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["a-material", "b-material"]);
}

#[tokio::test]
async fn update_logs_the_delta() {
    let app = TestApp::new().await;
    let material = app.add_material("แป้งข้าวเหนียว", 50, 10).await;
    let id = material["id"].as_str().unwrap();

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/materials/{id}"),
            Some(json!({ "quantity": 30, "pricePerUnit": 12 })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated = response_json(response).await["data"].clone();
    assert_eq!(decimal(&updated["quantity"]), Decimal::from(30));
    assert_eq!(decimal(&updated["pricePerUnit"]), Decimal::from(12));

    let history = app.history_of("แป้งข้าวเหนียว").await;
    let removal = history
        .iter()
        .find(|row| row["action"] == "ลบ")
        .expect("decrease logged as ลบ");
    assert_eq!(decimal(&removal["quantity"]), Decimal::from(20));

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/materials/{id}"),
            Some(json!({ "quantity": 45 })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let history = app.history_of("แป้งข้าวเหนียว").await;
    let additions: Vec<_> = history.iter().filter(|r| r["action"] == "เพิ่ม").collect();
    assert_eq!(additions.len(), 2);
    assert!(additions
        .iter()
        .any(|row| decimal(&row["quantity"]) == Decimal::from(15)));
}

#[tokio::test]
async fn update_rejects_name_collision_and_negative_quantity() {
    let app = TestApp::new().await;
    app.add_material("ใบตองตึง", 10, 1).await;
    let other = app.add_material("แป้งข้าวเหนียว", 10, 1).await;
    let id = other["id"].as_str().unwrap();

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/materials/{id}"),
            Some(json!({ "name": "ใบตองตึง" })),
        )
        .await;
    assert_eq!(response.status(), 409);

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/materials/{id}"),
            Some(json!({ "quantity": -1 })),
        )
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(app.stock_of("แป้งข้าวเหนียว").await, Some(Decimal::from(10)));
}

#[tokio::test]
async fn delete_logs_remaining_stock_and_unknown_id_is_404() {
    let app = TestApp::new().await;
    let material = app.add_material("ใบตองตึง", 12, 1).await;
    let id = material["id"].as_str().unwrap();

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/materials/{id}"), None)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(app.stock_of("ใบตองตึง").await, None);

    let history = app.history_of("ใบตองตึง").await;
    let deletion = history.iter().find(|r| r["action"] == "ลบ").unwrap();
    assert_eq!(decimal(&deletion["quantity"]), Decimal::from(12));

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/materials/{id}"), None)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn update_unit_by_name() {
    let app = TestApp::new().await;
    app.add_material("ใบตองตึง", 1, 1).await;

    let response = app
        .request_authenticated(
            Method::PATCH,
            "/api/materials/update-unit",
            Some(json!({ "name": "ใบตองตึง", "unit": "กิโลกรัม" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["unit"], "กิโลกรัม");

    let response = app
        .request_authenticated(
            Method::PATCH,
            "/api/materials/update-unit",
            Some(json!({ "name": "ไม่มี", "unit": "กิโลกรัม" })),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn quantity_increase_creates_unknown_material_with_default_unit() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/materials/quantity",
            Some(json!({ "name": "กาว", "quantity": 7, "operation": "increase" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["unit"], "หน่วย");
    assert_eq!(decimal(&body["data"]["pricePerUnit"]), Decimal::ZERO);
    assert_eq!(decimal(&body["data"]["quantity"]), Decimal::from(7));

    let history = app.history_of("กาว").await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["action"], "เพิ่ม");
}

#[tokio::test]
async fn quantity_decrease_beyond_stock_is_rejected_without_side_effects() {
    let app = TestApp::new().await;
    app.add_material("ใบตองตึง", 5, 1).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/materials/quantity",
            Some(json!({ "name": "ใบตองตึง", "quantity": 6, "operation": "decrease" })),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("ไม่เพียงพอ"));

    assert_eq!(app.stock_of("ใบตองตึง").await, Some(Decimal::from(5)));
    assert_eq!(app.history_of("ใบตองตึง").await.len(), 1);

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/materials/quantity",
            Some(json!({ "name": "ใบตองตึง", "quantity": 5, "operation": "decrease" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(app.stock_of("ใบตองตึง").await, Some(Decimal::ZERO));
    let history = app.history_of("ใบตองตึง").await;
    assert!(history.iter().any(|row| row["action"] == "นำไปใช้"));
}

#[tokio::test]
async fn quantity_decrease_on_unknown_material_is_404() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/materials/quantity",
            Some(json!({ "name": "ไม่มี", "quantity": 1, "operation": "decrease" })),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn quantity_must_be_positive() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/materials/quantity",
            Some(json!({ "name": "กาว", "quantity": 0, "operation": "increase" })),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn materials_require_a_token() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/materials", None, None).await;
    assert_eq!(response.status(), 401);

    let response = app
        .request(Method::GET, "/api/materials", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status(), 401);
}
