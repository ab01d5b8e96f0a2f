//! HTTP API exposing project and workspace endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use workspace_hub_core::{Folder, Project, ProjectRegistry, Workspace, WorkspaceError, WorkspaceStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<WorkspaceStore>,
    pub projects: Arc<ProjectRegistry>,
}

/// Maps store failures onto HTTP status codes.
#[derive(Debug)]
pub struct ApiError(WorkspaceError);

impl From<WorkspaceError> for ApiError {
    fn from(err: WorkspaceError) -> Self {
        ApiError(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(WorkspaceError::Storage(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WorkspaceError::ProjectNotFound(_) | WorkspaceError::PathNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            WorkspaceError::Conflict(_) => StatusCode::CONFLICT,
            WorkspaceError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            WorkspaceError::Storage(err) => {
                error!("storage failure: {:#}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct ProjectRequest {
    name: String,
}

#[derive(Deserialize)]
struct FileRequest {
    path: String,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct FolderRequest {
    path: String,
}

#[derive(Deserialize)]
struct RenameRequest {
    path: String,
    name: String,
}

#[derive(Deserialize)]
struct MoveRequest {
    path: String,
    destination: String,
}

#[derive(Deserialize)]
struct PathParams {
    path: String,
}

#[derive(Serialize, Deserialize)]
pub struct FileData {
    pub path: String,
    pub content: String,
}

type ApiResult<T> = Result<T, ApiError>;

pub fn router(store: Arc<WorkspaceStore>, projects: Arc<ProjectRegistry>) -> Router {
    let state = AppState { store, projects };
    Router::new()
        .route("/projects", post(create_project).get(list_projects))
        .route("/projects/{id}", get(get_project).delete(delete_project))
        .route("/projects/{id}/workspace", get(get_workspace))
        .route(
            "/projects/{id}/workspace/files",
            get(get_file_content)
                .post(create_file)
                .put(update_file_content)
                .patch(rename_file)
                .delete(delete_file),
        )
        .route("/projects/{id}/workspace/files/move", post(move_file))
        .route(
            "/projects/{id}/workspace/folders",
            post(create_folder).patch(rename_folder).delete(delete_folder),
        )
        .route("/projects/{id}/workspace/folders/move", post(move_folder))
        .with_state(state)
}

fn user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = state.projects.create(req.name, user_id(&headers))?;
    state.store.create_workspace(&project.id).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects(State(state): State<AppState>, headers: HeaderMap) -> Json<Vec<Project>> {
    let projects = match user_id(&headers) {
        Some(owner) => state.projects.find_by_owner(&owner),
        None => state.projects.list(),
    };
    Json(projects)
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    state
        .projects
        .get(&id)
        .map(Json)
        .ok_or(ApiError(WorkspaceError::ProjectNotFound(id)))
}

async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.projects.delete(&id)? {
        return Err(ApiError(WorkspaceError::ProjectNotFound(id)));
    }
    state.store.delete_workspace(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_workspace(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Workspace>> {
    Ok(Json(state.store.get_workspace(&id).await?))
}

async fn get_file_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PathParams>,
) -> ApiResult<Json<FileData>> {
    let file = state.store.get_file_content(&id, &params.path).await?;
    Ok(Json(FileData {
        path: file.absolute_path,
        content: file.content,
    }))
}

async fn create_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<FileRequest>,
) -> ApiResult<(StatusCode, Json<Folder>)> {
    let root = state
        .store
        .create_file(&id, &req.path, &req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(root)))
}

async fn update_file_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<FileRequest>,
) -> ApiResult<Json<FileData>> {
    let file = state
        .store
        .update_file_content(&id, &req.path, &req.content)
        .await?;
    Ok(Json(FileData {
        path: file.absolute_path,
        content: file.content,
    }))
}

async fn rename_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<Json<Folder>> {
    Ok(Json(state.store.rename_file(&id, &req.path, &req.name).await?))
}

async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PathParams>,
) -> ApiResult<Json<Folder>> {
    Ok(Json(state.store.delete_file(&id, &params.path).await?))
}

async fn move_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> ApiResult<Json<Folder>> {
    Ok(Json(
        state
            .store
            .move_file(&id, &req.path, &req.destination)
            .await?,
    ))
}

async fn create_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<FolderRequest>,
) -> ApiResult<(StatusCode, Json<Folder>)> {
    let root = state.store.create_folder(&id, &req.path).await?;
    Ok((StatusCode::CREATED, Json(root)))
}

async fn rename_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<Json<Folder>> {
    Ok(Json(
        state
            .store
            .rename_folder(&id, &req.path, &req.name)
            .await?,
    ))
}

async fn delete_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PathParams>,
) -> ApiResult<Json<Folder>> {
    Ok(Json(state.store.delete_folder(&id, &params.path).await?))
}

async fn move_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> ApiResult<Json<Folder>> {
    Ok(Json(
        state
            .store
            .move_folder(&id, &req.path, &req.destination)
            .await?,
    ))
}
