// Requests
pub mod create_task_request;
pub mod update_task_request;
pub mod register_request;
pub mod login_request;
pub mod update_user_request;
pub mod delete_account_request;


// Responses
pub mod task_response;
pub mod login_response;
pub mod user_get_response;
pub mod message_response;
