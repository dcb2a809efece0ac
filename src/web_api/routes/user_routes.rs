use axum::{middleware, routing::delete, Router};

use crate::{app_state::SharedState, authentication::auth::auth_middleware, user_controller::UserController};

pub const ROUTER_PATH: &str = "/users";

pub fn get_router(app_state: SharedState) -> Router {
    Router::new()
        .route(&format!("{}/:id", ROUTER_PATH), delete(UserController::delete))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}
