use axum::{
    middleware,
    routing::{post, put},
    Router,
};

use crate::{
    app_state::SharedState, authentication::auth::auth_middleware,
    authentication_controller::AuthenticationController,
};

pub const ROUTER_PATH: &str = "/auth";

pub fn get_router(app_state: SharedState) -> Router {
    let public = Router::new()
        .route(&format!("{}/register", ROUTER_PATH), post(AuthenticationController::register))
        .route(&format!("{}/login", ROUTER_PATH), post(AuthenticationController::login));

    let protected = Router::new()
        .route(&format!("{}/logout", ROUTER_PATH), post(AuthenticationController::logout))
        .route(
            &format!("{}/account", ROUTER_PATH),
            put(AuthenticationController::update_account).delete(AuthenticationController::delete_account),
        )
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware));

    public.merge(protected).with_state(app_state)
}
