use std::sync::Arc;

use crate::{TaskUsecase, UserUsecase};

pub struct AppState {
    pub task_usecase: TaskUsecase,
    pub user_usecase: UserUsecase,
}

pub type SharedState = Arc<AppState>;
