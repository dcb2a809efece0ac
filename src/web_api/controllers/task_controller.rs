use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    app_state::SharedState,
    caller::Caller,
    create_task_request::CreateTaskRequest,
    message_response::MessageResponse,
    task_response::TaskResponse,
    update_task_request::UpdateTaskRequest,
    web_api::api_error::{json_body, path_id},
    DomainResult,
};

pub struct TaskController {}

impl TaskController {
    pub async fn create(
        State(state): State<SharedState>,
        Extension(caller): Extension<Caller>,
        payload: Result<Json<CreateTaskRequest>, JsonRejection>,
    ) -> DomainResult<(StatusCode, Json<TaskResponse>)> {
        let task = state.task_usecase.create(&caller, json_body(payload)?).await?;
        Ok((StatusCode::CREATED, Json(task.to_response())))
    }

    pub async fn get_all(
        State(state): State<SharedState>,
        Extension(caller): Extension<Caller>,
    ) -> DomainResult<Json<Vec<TaskResponse>>> {
        let tasks = state.task_usecase.get_all_for_caller(&caller).await?;
        Ok(Json(tasks.iter().map(|t| t.to_response()).collect()))
    }

    pub async fn get(
        State(state): State<SharedState>,
        Extension(caller): Extension<Caller>,
        id: Result<Path<Uuid>, PathRejection>,
    ) -> DomainResult<Json<TaskResponse>> {
        let task = state.task_usecase.get_by_id(&caller, path_id(id)?).await?;
        Ok(Json(task.to_response()))
    }

    pub async fn update(
        State(state): State<SharedState>,
        Extension(caller): Extension<Caller>,
        id: Result<Path<Uuid>, PathRejection>,
        payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
    ) -> DomainResult<Json<TaskResponse>> {
        let id = path_id(id)?;
        let task = state.task_usecase.update(&caller, id, json_body(payload)?).await?;
        Ok(Json(task.to_response()))
    }

    pub async fn delete(
        State(state): State<SharedState>,
        Extension(caller): Extension<Caller>,
        id: Result<Path<Uuid>, PathRejection>,
    ) -> DomainResult<StatusCode> {
        state.task_usecase.delete(&caller, path_id(id)?).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    pub async fn clear(
        State(state): State<SharedState>,
        Extension(caller): Extension<Caller>,
    ) -> DomainResult<Json<MessageResponse>> {
        let removed = state.task_usecase.clear_all(&caller).await?;
        Ok(Json(MessageResponse::new(format!("{removed} tasks deleted"))))
    }
}
