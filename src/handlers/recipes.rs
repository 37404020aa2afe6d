use axum::response::Response;

use super::common::success_response;
use crate::recipes::RecipeBook;

/// The shared recipe table, with its version
#[utoipa::path(
    get,
    path = "/api/recipes",
    responses((status = 200, description = "Recipe book", body = RecipeBook)),
    security(("bearer_auth" = [])),
    tag = "recipes"
)]
pub async fn get_recipes() -> Response {
    success_response(RecipeBook::current())
}
