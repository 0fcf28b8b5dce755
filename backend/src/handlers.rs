use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use shared::{CreateTaskRequest, ListTasksQuery, MessageResponse, PaginatedTasksResponse};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<PaginatedTasksResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::bad_request(format!("Parâmetros inválidos: {}", rejection.body_text()))
    })?;
    let request = query.validate()?;

    let (tasks, total_items) = state
        .store
        .read(move |session| {
            let tasks = session.page(&request)?;
            let total_items = session.count()?;
            Ok::<_, ApiError>((tasks, total_items))
        })
        .await?;

    Ok(Json(PaginatedTasksResponse {
        page: request.page,
        limit: request.limit,
        total_items,
        tasks,
    }))
}

pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        ApiError::bad_request(format!("Corpo da requisição inválido: {}", rejection.body_text()))
    })?;

    let name = payload.name.clone();
    let id = state
        .store
        .write(move |session| {
            // A duplicate is reported before missing fields.
            if session.find_by_name(&payload.name)?.is_some() {
                return Err(ApiError::task_already_exists());
            }
            if !payload.has_required_fields() {
                return Err(ApiError::task_fields_required());
            }
            Ok(session.insert(&payload.name, &payload.description)?)
        })
        .await?;

    tracing::info!(id, %name, "task created");
    Ok((StatusCode::CREATED, Json(MessageResponse::created(&name))))
}

pub async fn complete_task(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let task = state
        .store
        .write(move |session| {
            let task = session
                .find_by_name(&name)?
                .ok_or_else(ApiError::task_not_found)?;
            session.mark_completed(task.id)?;
            Ok::<_, ApiError>(task)
        })
        .await?;

    tracing::info!(id = task.id, name = %task.name, "task completed");
    Ok(Json(MessageResponse::completed(&task.name)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let task = state
        .store
        .write(move |session| {
            let task = session
                .find_by_name(&name)?
                .ok_or_else(ApiError::task_not_found)?;
            session.delete(task.id)?;
            Ok::<_, ApiError>(task)
        })
        .await?;

    tracing::info!(id = task.id, name = %task.name, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}
