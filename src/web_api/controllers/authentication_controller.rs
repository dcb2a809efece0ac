use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};

use crate::{
    app_state::SharedState, caller::Caller, delete_account_request::DeleteAccountRequest,
    login_request::LoginRequest, login_response::LoginResponse, message_response::MessageResponse,
    register_request::RegisterRequest, update_user_request::UpdateUserRequest,
    user_get_response::UserGetResponse, web_api::api_error::json_body, DomainResult,
};

pub struct AuthenticationController {}

impl AuthenticationController {
    pub async fn register(
        State(state): State<SharedState>,
        payload: Result<Json<RegisterRequest>, JsonRejection>,
    ) -> DomainResult<(StatusCode, Json<UserGetResponse>)> {
        let user = state.user_usecase.register(json_body(payload)?).await?;
        Ok((StatusCode::CREATED, Json(user.to_get_dto())))
    }

    pub async fn login(
        State(state): State<SharedState>,
        payload: Result<Json<LoginRequest>, JsonRejection>,
    ) -> DomainResult<Json<LoginResponse>> {
        let (user, token) = state.user_usecase.login(json_body(payload)?).await?;
        Ok(Json(LoginResponse {
            token,
            user: user.to_get_dto(),
        }))
    }

    /// Tokens are stateless; the client drops its copy.
    pub async fn logout(Extension(caller): Extension<Caller>) -> Json<MessageResponse> {
        tracing::info!(user_id = %caller.id, "user logged out");
        Json(MessageResponse::new("logged out"))
    }

    pub async fn update_account(
        State(state): State<SharedState>,
        Extension(caller): Extension<Caller>,
        payload: Result<Json<UpdateUserRequest>, JsonRejection>,
    ) -> DomainResult<Json<UserGetResponse>> {
        let user = state.user_usecase.update_account(&caller, json_body(payload)?).await?;
        Ok(Json(user.to_get_dto()))
    }

    pub async fn delete_account(
        State(state): State<SharedState>,
        Extension(caller): Extension<Caller>,
        payload: Result<Json<DeleteAccountRequest>, JsonRejection>,
    ) -> DomainResult<StatusCode> {
        let request = json_body(payload)?;
        state.user_usecase.delete_account(&caller, &request.password).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
