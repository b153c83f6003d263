// Presentation layer - JSON surface for the meter board
pub mod api_error;
pub mod app_state;
pub mod handlers;
