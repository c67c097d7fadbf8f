mod error;
mod middleware;
mod posts;

pub use error::{ApiError, ApiErrorBody, codes};
pub use middleware::RequestContext;

use std::sync::Arc;

use axum::{Router, middleware as axum_middleware, routing::get};

use crate::application::query::QueryService;

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub query: Arc<QueryService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/ping", get(posts::ping))
        .route("/api/posts", get(posts::list_posts))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
