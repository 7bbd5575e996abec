//! One handler per endpoint: each decoding its input, calling the matching
//! engine entry point, and rendering the result through [`crate::wire`].

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use accounts_engine::{filter, group, recommend, suggest, wire as engine_wire};

use crate::error::ApiError;
use crate::query;
use crate::state::AppState;
use crate::wire;

fn decode_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("malformed body: {e}")))
}

/// `GET /accounts/filter/`.
pub async fn filter(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let params = query::decode(raw.as_deref().unwrap_or(""))?;
    let store = state.read();
    let plan = filter::parse(&store.accounts, &params)?;
    let outcome = filter::execute(&store, &plan);
    let accounts: Vec<_> = outcome
        .ids
        .iter()
        .filter_map(|&id| store.accounts.get(id).ok())
        .map(|account| wire::render_filter_row(account, &store.accounts, &outcome.projection))
        .collect();
    Ok(Json(json!({ "accounts": accounts })))
}

/// `GET /accounts/group/`.
pub async fn group(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let params = query::decode(raw.as_deref().unwrap_or(""))?;
    let store = state.read();
    let plan = group::parse(&params)?;
    let rows = group::execute(&store, &plan);
    let groups: Vec<_> = rows.iter().map(wire::render_group_row).collect();
    Ok(Json(json!({ "groups": groups })))
}

/// `GET /accounts/{id}/recommend/`.
pub async fn recommend(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let params = query::decode(raw.as_deref().unwrap_or(""))?;
    let store = state.read();
    let plan = recommend::parse(id, &params)?;
    let results = recommend::execute(&store, &plan)?;
    let accounts: Vec<_> = results.iter().map(wire::render_recommended).collect();
    Ok(Json(json!({ "accounts": accounts })))
}

/// `GET /accounts/{id}/suggest/`.
pub async fn suggest(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let params = query::decode(raw.as_deref().unwrap_or(""))?;
    let store = state.read();
    let plan = suggest::parse(id, &params)?;
    let results = suggest::execute(&store, &plan)?;
    let accounts: Vec<_> = results.iter().map(wire::render_suggested).collect();
    Ok(Json(json!({ "accounts": accounts })))
}

/// `POST /accounts/new/` — insert.
pub async fn insert(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let json: engine_wire::AccountJson = decode_body(&body)?;
    let (new_account, interests, likes) = engine_wire::decode_account(json)?;
    let id = new_account.id;
    let email = new_account.email.clone();
    state
        .write()
        .insert_account(new_account, &interests, &likes)?;
    tracing::info!(id, email, "account inserted");
    Ok((StatusCode::CREATED, Json(json!({}))))
}

/// `POST /accounts/{id}/` — update.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let json: engine_wire::AccountPatchJson = decode_body(&body)?;
    let patch = engine_wire::decode_patch(json)?;
    state.write().update_account(id, &patch)?;
    tracing::info!(id, "account updated");
    Ok((StatusCode::ACCEPTED, Json(json!({}))))
}

/// `POST /accounts/likes/` — bulk like append.
pub async fn likes(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let json: engine_wire::LikesBatchJson = decode_body(&body)?;
    let edges = engine_wire::decode_likes_batch(json);
    let count = edges.len();
    state.write().append_likes_bulk(&edges)?;
    tracing::info!(count, "likes appended");
    Ok((StatusCode::ACCEPTED, Json(json!({}))))
}

/// Fallback for any unrecognized route.
pub async fn not_found() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}
