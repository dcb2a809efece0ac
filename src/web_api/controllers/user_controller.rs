use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Extension,
};
use uuid::Uuid;

use crate::{app_state::SharedState, caller::Caller, web_api::api_error::path_id, DomainResult};

pub struct UserController {}

impl UserController {
    pub async fn delete(
        State(state): State<SharedState>,
        Extension(caller): Extension<Caller>,
        id: Result<Path<Uuid>, PathRejection>,
    ) -> DomainResult<StatusCode> {
        state.user_usecase.delete_user(&caller, path_id(id)?).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
