pub mod access_control_service;
pub mod project_service;
pub mod token_service;
pub mod user_service;

pub use access_control_service::AccessControlService;
pub use project_service::ProjectService;
pub use user_service::UserService;
