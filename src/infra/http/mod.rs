mod middleware;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::application::{components::ComponentService, error::HttpError};
use crate::domain::locales::DEFAULT_LOCALE;

use self::middleware::{log_responses, set_request_context};

/// Response header naming the tier that served a component.
pub const CACHE_ORIGIN_HEADER: &str = "x-cache-origin";

#[derive(Clone)]
pub struct HttpState {
    pub components: Arc<ComponentService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/component/{component_type}", get(component))
        .fallback(fallback)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LanguageQuery {
    lang: Option<String>,
}

impl LanguageQuery {
    fn language(&self) -> &str {
        match self.lang.as_deref() {
            Some(lang) if !lang.is_empty() => lang,
            _ => DEFAULT_LOCALE,
        }
    }
}

async fn health(State(state): State<HttpState>) -> Response {
    Json(state.components.health().await).into_response()
}

async fn component(
    State(state): State<HttpState>,
    Path(component_type): Path<String>,
    Query(query): Query<LanguageQuery>,
) -> Response {
    match state
        .components
        .component(&component_type, query.language())
        .await
    {
        Ok(served) => {
            let mut response = Json(served.component).into_response();
            response.headers_mut().insert(
                CACHE_ORIGIN_HEADER,
                HeaderValue::from_static(served.origin.as_str()),
            );
            response
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn fallback() -> Response {
    HttpError::new(
        "infra::http::fallback",
        StatusCode::NOT_FOUND,
        "route not found",
        "no route matched the request path",
    )
    .into_response()
}
