//! Application state shared across all request handlers.

use bondwatch_core::reliability::HealthController;

/// Cheap to clone; the controller is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub health: HealthController,
}

impl AppState {
    pub fn new(health: HealthController) -> Self {
        Self { health }
    }
}
