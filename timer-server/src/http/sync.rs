//! The `/api/sync` endpoint.
//!
//! Check order for both methods: storage configured, then caller
//! authenticated, then (for pushes) payload shape. Storage failures are
//! reported as soft failures (HTTP 200 with `success: false`).

use crate::server::SyncServer;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use cubetime_types::validate::validate_push_body;
use cubetime_types::{errors, PullResponse, PushRequest, PushResponse, ValidationError};
use serde::Serialize;
use std::sync::Arc;

use crate::error::StorageError;
use crate::storage::UserStore;

/// Body of a 401 response.
#[derive(Debug, Serialize)]
struct Unauthorized {
    success: bool,
    error: &'static str,
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(Unauthorized {
            success: false,
            error: errors::NOT_AUTHENTICATED,
        }),
    )
        .into_response()
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

/// `GET /api/sync`: the caller's whole remote copy.
pub async fn pull_handler(
    Extension(server): Extension<Arc<SyncServer>>,
    headers: HeaderMap,
) -> Response {
    let Some(store) = server.store() else {
        return Json(PullResponse::failed(errors::NOT_CONFIGURED)).into_response();
    };
    let Some(user_id) = server.authenticate(authorization(&headers)) else {
        return unauthorized();
    };

    match read_all(store, user_id).await {
        Ok(response) => {
            tracing::debug!(user_id, solves = response.solves.len(), "pull");
            Json(response).into_response()
        }
        Err(e) => {
            tracing::error!(user_id, error = %e, "error in GET /api/sync");
            Json(PullResponse::failed(errors::FETCH_FAILED)).into_response()
        }
    }
}

async fn read_all(store: &UserStore, user_id: &str) -> Result<PullResponse, StorageError> {
    let (solves, settings, last_sync) = tokio::try_join!(
        store.solves(user_id),
        store.settings(user_id),
        store.last_sync(user_id),
    )?;
    Ok(PullResponse::ok(solves, settings, last_sync))
}

/// `POST /api/sync`: replace whichever values the body carries.
pub async fn push_handler(
    Extension(server): Extension<Arc<SyncServer>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(store) = server.store() else {
        return Json(PushResponse::failed(errors::NOT_CONFIGURED)).into_response();
    };
    let Some(user_id) = server.authenticate(authorization(&headers)) else {
        return unauthorized();
    };

    let request = match parse_push(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match write_all(store, user_id, &request).await {
        Ok(response) => {
            tracing::debug!(
                user_id,
                solves = request.solves.as_ref().map(Vec::len),
                settings = request.settings.is_some(),
                "push"
            );
            Json(response).into_response()
        }
        Err(e) => {
            tracing::error!(user_id, error = %e, "error in POST /api/sync");
            Json(PushResponse::failed(errors::SAVE_FAILED)).into_response()
        }
    }
}

fn parse_push(body: &[u8]) -> Result<PushRequest, Response> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "unparseable push body");
        Json(PushResponse::failed(errors::SAVE_FAILED)).into_response()
    })?;

    validate_push_body(&value).map_err(|e| {
        tracing::warn!(error = %e, "rejected push body");
        let rejected = |error: &str| {
            (StatusCode::BAD_REQUEST, Json(PushResponse::failed(error))).into_response()
        };
        match e {
            ValidationError::Solves { .. } => rejected(errors::INVALID_SOLVES),
            ValidationError::Settings { .. } => rejected(errors::INVALID_SETTINGS),
            ValidationError::NotAnObject => {
                Json(PushResponse::failed(errors::SAVE_FAILED)).into_response()
            }
        }
    })
}

async fn write_all(
    store: &UserStore,
    user_id: &str,
    request: &PushRequest,
) -> Result<PushResponse, StorageError> {
    if let Some(solves) = &request.solves {
        store.set_solves(user_id, solves).await?;
    }
    if let Some(settings) = &request.settings {
        store.set_settings(user_id, settings).await?;
    }
    let last_sync = store.last_sync(user_id).await?;
    Ok(PushResponse::ok(last_sync))
}
