use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leaf-plate API",
        version = "0.1.0",
        description = r#"
# Leaf-plate workshop API

Back end for a small leaf-plate (จานใบตองตึง) workshop.

## Features

- **Materials**: raw-material stock with an append-only history
- **Production orders**: recipe-driven consumption, reconciliation on edit, returns on delete
- **Transactions**: income and expense bookkeeping
- **Reports**: period summary and CSV exports

## Authentication

Everything under `/api` except register and login needs a bearer token:

```
Authorization: Bearer <token>
```

## Rate Limiting

- `X-RateLimit-Limit`: Maximum requests per window
- `X-RateLimit-Remaining`: Remaining requests in current window
- `X-RateLimit-Reset`: Seconds until the window resets

## Error Handling

```json
{
  "success": false,
  "error": "Bad Request",
  "message": "วัตถุดิบ ใบตองตึง ไม่เพียงพอ (ต้องการ 40, คงเหลือ 12)",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:5000", description = "Local development")),
    tags(
        (name = "auth", description = "Registration, login and tokens"),
        (name = "materials", description = "Raw-material stock"),
        (name = "material-history", description = "Stock change log"),
        (name = "orders", description = "Production orders"),
        (name = "transactions", description = "Income and expense ledger"),
        (name = "recipes", description = "Recipe book"),
        (name = "reports", description = "Summaries and CSV exports"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::auth::logout,

        crate::handlers::materials::list_materials,
        crate::handlers::materials::add_material,
        crate::handlers::materials::update_material,
        crate::handlers::materials::delete_material,
        crate::handlers::materials::update_unit,
        crate::handlers::materials::adjust_quantity,

        crate::handlers::material_history::list_history,
        crate::handlers::material_history::create_history_entry,

        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::create_order,
        crate::handlers::orders::record_production,
        crate::handlers::orders::update_order,
        crate::handlers::orders::delete_order,

        crate::handlers::transactions::list_transactions,
        crate::handlers::transactions::create_transaction,
        crate::handlers::transactions::update_transaction,
        crate::handlers::transactions::delete_transaction,

        crate::handlers::recipes::get_recipes,

        crate::handlers::reports::summary,
        crate::handlers::reports::export,

        crate::health::health_check,
    ),
    components(
        schemas(
            crate::ResponseMeta,
            crate::errors::ErrorResponse,
            crate::entities::material_history::HistoryAction,
            crate::services::materials::StockOperation,
            crate::handlers::common::PlateCount,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// `GET /api-docs/openapi.json`
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
