mod common;

use axum::http::Method;

use common::{response_json, TestApp};

#[tokio::test]
async fn health_reports_database_up() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"], "up");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let response = app.request(Method::GET, "/health/live", None, None).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn recipes_are_served_with_their_version() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(Method::GET, "/api/recipes", None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(
        body["data"]["version"],
        leafplate_api::recipes::RECIPE_BOOK_VERSION
    );
    let square = &body["data"]["recipes"]["จานสี่เหลี่ยม"];
    assert_eq!(square["ใบตองตึง"], "4");
    assert_eq!(square["แป้งข้าวเหนียว"], "2");
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(Method::GET, "/api/recipes", None)
        .await;
    let header = response
        .headers()
        .get(leafplate_api::middleware_helpers::REQUEST_ID_HEADER)
        .expect("request id header")
        .to_str()
        .unwrap()
        .to_string();
    let body = response_json(response).await;
    assert_eq!(body["meta"]["request_id"], header);
}

#[tokio::test]
async fn openapi_document_is_public() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert!(body["paths"]["/api/materials"].is_object());
}

#[tokio::test]
async fn unknown_route_is_a_json_404() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(Method::GET, "/api/nothing-here", None)
        .await;
    assert_eq!(response.status(), 404);
}
