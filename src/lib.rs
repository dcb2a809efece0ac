
//---------------------------------------
pub mod web_api {
    pub mod routes;
    pub mod controllers;
    pub mod api_error;
}

pub use web_api::routes::map_routes;
pub use web_api::controllers::*;
//---------------------------------------

//---------------------------------------
pub mod shared {
    pub mod models;
    pub mod dto;
    pub mod errors;
    pub mod validation;
}

pub use shared::models::*;
pub use shared::dto::*;
pub use shared::errors::*;
//---------------------------------------

//---------------------------------------
pub mod authentication {
    pub mod auth;
}
//---------------------------------------

//---------------------------------------
pub mod data_access {
    pub mod task_repository;
    pub mod user_repository;
    pub mod memory_repository;
    pub mod data_context;
}

pub use data_access::task_repository::{RepositoryError, TaskRepository};
pub use data_access::user_repository::UserRepository;
//---------------------------------------

//---------------------------------------
pub mod usecases {
    pub mod task_usecase;
    pub mod user_usecase;
}

pub use usecases::task_usecase::TaskUsecase;
pub use usecases::user_usecase::UserUsecase;
//---------------------------------------
