use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use cja::app_state::AppState as _;

use super::{api, auth};
use crate::AppState;

pub(crate) fn make_router() -> Router<AppState> {
    Router::new()
        .route("/_", get(versions))
        .nest("/api/auth", auth::routes::routes())
        .route(
            "/api/recipes",
            get(api::recipes::list_recipes).post(api::recipes::create_recipe),
        )
        .route(
            "/api/recipes/categories",
            get(api::recipes::list_categories),
        )
        .route(
            "/api/recipes/{id}",
            get(api::recipes::get_recipe)
                .put(api::recipes::update_recipe)
                .delete(api::recipes::delete_recipe),
        )
        .route("/api/recipes/{id}/form", get(api::recipes::recipe_form))
        .route(
            "/api/recipes/{id}/favorite",
            post(api::recipes::set_favorite),
        )
        .route(
            "/api/ingredients",
            get(api::ingredients::search_ingredients),
        )
        .route("/api/users/{id}", get(api::users::get_user))
}

async fn versions(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "version": state.version() }))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt as _;

    use crate::http_server::test_helpers::{create_test_app, response_body_json};

    #[sqlx::test(migrations = "../db/migrations")]
    async fn versions_reports_the_package_version(pool: db::SqlitePool) {
        let app = create_test_app(pool);

        let response = app
            .oneshot(Request::get("/_").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response_body_json(response).await;
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
