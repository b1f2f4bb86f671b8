//! Portfolio service routes

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use time::Duration;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use tracing::{debug, error, info, warn};

use crate::{
    AppState,
    auth::{AdminIdentity, establish_session},
    error::{ApiError, ApiResult},
    extract::ApiJson,
    middleware::{rate_limit, require_admin},
    models::{
        LoginRequest,
        work::{DeleteWorkRequest, NewWork},
    },
    storage::{PendingUpload, UPLOAD_URL_PREFIX, resolve_media_type},
};

/// Room for multipart framing and text fields on top of the file itself
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

const SESSION_COOKIE_NAME: &str = "portfolio.sid";

/// Create the router for the portfolio service
pub fn create_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES)
        .unwrap_or(usize::MAX);

    let admin_routes = Router::new()
        .route("/api/admin/works", get(list_admin_works))
        .route(
            "/api/admin/add",
            post(add_work).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/admin/delete", post(delete_work))
        .route_layer(middleware::from_fn(require_admin));

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_signed(state.session_key.clone())
        .with_secure(state.config.session_cookie_secure)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            state.config.session_ttl_seconds,
        )));

    let client_dir = state.config.client_dir.clone();
    let client = ServeDir::new(&client_dir).fallback(ServeFile::new(client_dir.join("index.html")));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/works", get(list_works))
        .route("/api/admin/login", post(login))
        .route("/api/admin/logout", post(logout))
        .merge(admin_routes)
        .nest_service(UPLOAD_URL_PREFIX, ServeDir::new(state.storage.root()))
        .fallback_service(client)
        .layer(session_layer)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    common::database::health_check(&state.db_pool)
        .await
        .map_err(|e| {
            error!("Health check failed: {}", e);
            ApiError::Database(e)
        })?;

    Ok(Json(json!({
        "status": "ok",
        "service": "portfolio"
    })))
}

/// Get all works, newest first
pub async fn list_works(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let works = state.work_repository.list_all().await.map_err(|e| {
        error!("Failed to list works: {}", e);
        ApiError::Database(e)
    })?;

    Ok(Json(works))
}

/// Admin login endpoint
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: LoginRequest,
) -> ApiResult<impl IntoResponse> {
    info!("Login attempt for user: {}", payload.user);

    let identity = state
        .credentials
        .verify(&payload.user, &payload.pass)
        .await
        .ok_or_else(|| {
            warn!("Rejected login for user: {}", payload.user);
            ApiError::Forbidden
        })?;

    establish_session(&session, &identity).await?;
    info!("Admin {} logged in", identity.username);

    Ok((StatusCode::OK, Json(json!({"message": "Logged in"}))))
}

/// Logout endpoint
pub async fn logout(session: Session) -> ApiResult<impl IntoResponse> {
    session.flush().await?;

    Ok((StatusCode::OK, Json(json!({"message": "Logged out"}))))
}

/// Get id and title of every work for the management list
pub async fn list_admin_works(
    State(state): State<AppState>,
    Extension(_admin): Extension<AdminIdentity>,
) -> ApiResult<impl IntoResponse> {
    let works = state.work_repository.list_summaries().await.map_err(|e| {
        error!("Failed to list works: {}", e);
        ApiError::Database(e)
    })?;

    Ok(Json(works))
}

/// Upload a new work
///
/// The file is streamed to disk under the size cap; the row is inserted
/// afterwards and the file is only kept once the insert succeeded.
pub async fn add_work(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut title = None;
    let mut description = None;
    let mut upload: Option<(PendingUpload, String)> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "title" => title = Some(field.text().await?),
            "desc" => description = Some(field.text().await?),
            "file" => {
                if upload.is_some() {
                    return Err(ApiError::BadRequest(
                        "Exactly one media file is allowed".to_string(),
                    ));
                }

                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::BadRequest("Media file name is missing".to_string()))?;
                let media_type = resolve_media_type(&file_name, field.content_type())?;

                let mut pending = state
                    .storage
                    .begin_upload(&file_name, state.config.max_upload_bytes)
                    .await?;

                while let Some(chunk) = field.chunk().await? {
                    pending.write_chunk(&chunk).await?;
                }
                pending.finish().await?;

                upload = Some((pending, media_type));
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let (pending, media_type) =
        upload.ok_or_else(|| ApiError::BadRequest("A media file is required".to_string()))?;

    let new_work = NewWork {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        url: pending.url(),
        media_type,
    };

    let id = state
        .work_repository
        .insert(&new_work)
        .await
        .map_err(|e| {
            error!("Failed to insert work: {}", e);
            ApiError::Database(e)
        })?;

    let size = pending.written();
    pending.commit();

    info!(
        "Admin {} added work {} ({}, {} bytes) at {}",
        admin.username, id, new_work.media_type, size, new_work.url
    );

    Ok(StatusCode::CREATED)
}

/// Delete a work and its media file
///
/// Unknown ids succeed without doing anything. A media file that cannot
/// be removed is logged and otherwise ignored.
pub async fn delete_work(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    ApiJson(payload): ApiJson<DeleteWorkRequest>,
) -> ApiResult<impl IntoResponse> {
    let url = state
        .work_repository
        .delete(payload.id)
        .await
        .map_err(|e| {
            error!("Failed to delete work {}: {}", payload.id, e);
            ApiError::Database(e)
        })?;

    match url {
        Some(url) => {
            if let Err(e) = state.storage.remove(&url).await {
                warn!(
                    "Deleted work {} but failed to remove media file {}: {}",
                    payload.id, url, e
                );
            }
            info!("Admin {} deleted work {}", admin.username, payload.id);
        }
        None => debug!("Delete of unknown work {} ignored", payload.id),
    }

    Ok(StatusCode::NO_CONTENT)
}
