pub mod auth_handler;
pub mod image_handler;
pub mod status_handler;
