//! HTTP front end for `accounts-engine`: axum routing, query-string
//! decoding, JSON wire framing, boot sequencing, and error-to-status
//! mapping. None of this lives in the engine crate itself — it exists so
//! the workspace has something to own `main`.

pub mod error;
pub mod handlers;
pub mod query;
pub mod state;
pub mod wire;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the axum `Router` mapping the seven endpoints to the handlers in
/// [`handlers`]. Exposed separately from `serve` so integration tests can
/// drive it on an ephemeral listener.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/accounts/filter/", get(handlers::filter))
        .route("/accounts/group/", get(handlers::group))
        .route("/accounts/{id}/recommend/", get(handlers::recommend))
        .route("/accounts/{id}/suggest/", get(handlers::suggest))
        .route("/accounts/new/", post(handlers::insert))
        .route("/accounts/likes/", post(handlers::likes))
        .route("/accounts/{id}/", post(handlers::update))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `state` on `listener` until the process is signaled to stop.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) {
    let app = router(state);
    axum::serve(listener, app).await.expect("server loop exited");
}
