// Application state for HTTP handlers
use crate::application::reading_service::ReadingService;

#[derive(Clone)]
pub struct AppState {
    pub reading_service: ReadingService,
}
