//! Generic JSON handlers over a [`ResourceHook`](crate::hooks::ResourceHook).
//!
//! Every handler builds a hook for the request, drives one operation on it and
//! answers with the hook's cache after it, so the response is what the hook
//! holds once the operation has re-synchronized.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use florist_core::{DocumentId, Entity, Searchable};

use crate::error::AppError;
use crate::hooks::Snapshot;
use crate::state::AppState;

/// Query string for search endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// Response for a created record.
#[derive(Debug, Serialize)]
pub struct Created<E> {
    pub id: DocumentId,
    #[serde(flatten)]
    pub snapshot: Snapshot<E>,
}

/// `GET /api/{collection}`: reload and list.
pub async fn list<E: Entity>(State(state): State<AppState>) -> Json<Snapshot<E>>
{
    let hook = state.resource::<E>();
    hook.fetch().await;
    Json(hook.snapshot().await)
}

/// `POST /api/{collection}`: add a record.
///
/// # Errors
///
/// Returns 400 for a malformed body, or the store error if the insert fails.
pub async fn create<E: Entity>(
    State(state): State<AppState>,
    body: Result<Json<E>, JsonRejection>,
) -> Result<(StatusCode, Json<Created<E>>), AppError>
{
    let Json(data) = body?;
    let hook = state.resource::<E>();
    let id = hook.add(data).await?;
    Ok((
        StatusCode::CREATED,
        Json(Created {
            id,
            snapshot: hook.snapshot().await,
        }),
    ))
}

/// `PATCH /api/{collection}/{id}`: apply a typed patch.
///
/// # Errors
///
/// Returns 400 for unknown or malformed fields, 404 if the record does not
/// exist.
pub async fn update<E: Entity>(
    State(state): State<AppState>,
    id: Result<Path<DocumentId>, PathRejection>,
    body: Result<Json<E::Patch>, JsonRejection>,
) -> Result<Json<Snapshot<E>>, AppError>
{
    let Path(id) = id?;
    let Json(patch) = body?;
    let hook = state.resource::<E>();
    hook.update(&id, patch).await?;
    Ok(Json(hook.snapshot().await))
}

/// `DELETE /api/{collection}/{id}`: remove a record.
///
/// # Errors
///
/// Returns the store error if the delete fails.
pub async fn delete<E: Entity>(
    State(state): State<AppState>,
    id: Result<Path<DocumentId>, PathRejection>,
) -> Result<Json<Snapshot<E>>, AppError>
{
    let Path(id) = id?;
    let hook = state.resource::<E>();
    hook.delete(&id).await?;
    Ok(Json(hook.snapshot().await))
}

/// `GET /api/{collection}/search?q=`: prefix search.
///
/// # Errors
///
/// Returns 400 for a malformed query string.
pub async fn search<E: Searchable>(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Snapshot<E>>, AppError>
{
    let Query(params) = params?;
    let hook = state.resource::<E>();
    hook.search(params.q.as_deref().unwrap_or_default()).await;
    Ok(Json(hook.snapshot().await))
}
