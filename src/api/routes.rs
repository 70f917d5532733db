//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - Visit counting per matched route
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Cities
        .route("/api/cities", get(handlers::list_cities))
        .route("/api/cities/:id", put(handlers::update_city))
        // Countries
        .route(
            "/api/countries",
            get(handlers::list_countries)
                .post(handlers::add_country)
                .delete(handlers::delete_all_countries),
        )
        .route("/api/countries/bulk", post(handlers::add_countries))
        .route("/api/countries/search", get(handlers::search_countries))
        .route(
            "/api/countries/:id",
            get(handlers::get_country)
                .put(handlers::update_country)
                .delete(handlers::delete_country),
        )
        .route(
            "/api/countries/:id/cities",
            get(handlers::cities_by_country)
                .post(handlers::add_cities)
                .delete(handlers::delete_cities_of_country),
        )
        .route("/api/countries/:id/city", post(handlers::add_city))
        .route(
            "/api/countries/:id/cities/:city_id",
            delete(handlers::delete_city),
        )
        .route(
            "/api/countries/:id/nations",
            get(handlers::nations_by_country).post(handlers::add_nation_to_country),
        )
        .route(
            "/api/countries/:id/nations/:nation_id",
            delete(handlers::remove_nation_from_country),
        )
        // Nations
        .route("/api/nations", get(handlers::list_nations))
        .route(
            "/api/nations/:id",
            put(handlers::update_nation).delete(handlers::delete_nation),
        )
        .route(
            "/api/nations/:id/countries",
            get(handlers::countries_by_nation),
        )
        // Operations
        .route("/api/cache/stats", get(handlers::stats_handler))
        .route("/api/visits", get(handlers::visits_handler))
        .route("/health", get(handlers::health_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::track_visits,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use crate::services::ViewCache;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let cache = ViewCache::new(100, Duration::from_secs(300)).unwrap();
        let state = AppState::new(Arc::new(InMemoryRepository::new()), cache);
        create_router(state)
    }

    async fn status_of(app: Router, method: &str, uri: &str) -> StatusCode {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(status_of(create_test_app(), "GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/api/cache/stats").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_search_route_is_not_an_id() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/api/countries/search?city=x").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_get_country_not_found() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/api/countries/7").await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_create_country_endpoint() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/countries")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"Belarus","capital":"Minsk"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
