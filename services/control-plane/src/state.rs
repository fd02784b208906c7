//! Application state shared across request handlers.

use std::sync::Arc;

use crate::launch::Launcher;
use crate::zones::ZoneService;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    zones: ZoneService,
    launcher: Launcher,
}

impl AppState {
    /// Create a new application state.
    pub fn new(zones: ZoneService) -> Self {
        let launcher = Launcher::new(zones.clone());
        Self {
            inner: Arc::new(AppStateInner { zones, launcher }),
        }
    }

    /// Get the zone service.
    pub fn zones(&self) -> &ZoneService {
        &self.inner.zones
    }

    /// Get the instance launcher.
    pub fn launcher(&self) -> &Launcher {
        &self.inner.launcher
    }
}
