//! Request handlers.
//!
//! # Responsibilities
//! - Extract path parameters and bodies
//! - Call the account manager
//! - Shape success responses (status, `Location`, JSON)
//!
//! # Design Decisions
//! - Bodies are parsed by hand so malformed input is a 400 with a JSON error
//! - Failures are returned as `ApiError` and never mapped here

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::collections::HashMap;
use url::Url;

use crate::domain::{Account, AccountId, AccountRecord, Beneficiary, Percentage};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::security::Principal;

type ApiResult<T> = Result<T, ApiError>;

/// GET /accounts/{id}
pub async fn account_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Account>> {
    let id = parse_id(&id)?;
    Ok(Json(state.manager.get_account(id).await?))
}

/// GET /accounts
pub async fn account_summary(State(state): State<AppState>) -> ApiResult<Json<Vec<Account>>> {
    let accounts = state.manager.get_all_accounts().await?;
    Ok(Json(accounts.collect()))
}

/// POST /accounts
pub async fn create_account(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    let record: AccountRecord = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("invalid account: {e}")))?;
    let mut account = Account::try_from(record)?;
    // Ids are always assigned by the store.
    account.clear_id();

    let saved = state.manager.save(account).await?;
    let id = saved
        .id()
        .ok_or_else(|| ApiError::Internal("store returned an account without an id".into()))?;

    created(&format!("/accounts/{id}"))
}

/// GET /accounts/{id}/beneficiaries/{name}
pub async fn beneficiary_details(
    State(state): State<AppState>,
    Path((id, name)): Path<(String, String)>,
) -> ApiResult<Json<Beneficiary>> {
    let account = state.manager.get_account(parse_id(&id)?).await?;
    Ok(Json(account.beneficiary(&name)?.clone()))
}

/// POST /accounts/{id}/beneficiaries, body is the beneficiary name as text.
pub async fn add_beneficiary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let name = body.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("beneficiary name must not be empty".into()));
    }

    state.manager.add_beneficiary(id, name).await?;
    created(&beneficiary_location(id, name)?)
}

/// DELETE /accounts/{id}/beneficiaries/{name}
pub async fn remove_beneficiary(
    State(state): State<AppState>,
    Path((id, name)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    // Report a missing account before looking at the beneficiary.
    state.manager.get_account(id).await?;
    state.manager.remove_beneficiary(id, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /accounts/{id}/beneficiaries, body maps names to allocations.
pub async fn update_allocations(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    let allocations: HashMap<String, Percentage> = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("invalid allocations: {e}")))?;

    state
        .manager
        .update_beneficiary_allocations(id, allocations)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /authorities
pub async fn authorities(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Response {
    let health = state.health.health().await;
    let status = if health.status.is_up() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health)).into_response()
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no resource at {}", uri.path()))
}

fn parse_id(raw: &str) -> ApiResult<AccountId> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("'{raw}' is not a valid account id")))
}

fn created(location: &str) -> ApiResult<Response> {
    let value = HeaderValue::from_str(location)
        .map_err(|e| ApiError::Internal(format!("bad location header: {e}")))?;
    Ok((StatusCode::CREATED, [(header::LOCATION, value)]).into_response())
}

/// `/accounts/{id}/beneficiaries/{name}` with the name percent-encoded.
fn beneficiary_location(id: AccountId, name: &str) -> ApiResult<String> {
    let mut url = Url::parse("http://localhost/")
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let id = id.to_string();
    url.path_segments_mut()
        .map_err(|_| ApiError::Internal("base url cannot hold a path".into()))?
        .pop_if_empty()
        .extend(["accounts", id.as_str(), "beneficiaries", name]);
    Ok(url.path().to_string())
}
