use crate::domain::ServiceId;
use tracing::debug;

/// Resolves service names and knows which service the user syncs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceManager {
    current: ServiceId,
}

impl ServiceManager {
    #[must_use]
    pub const fn new(current: ServiceId) -> Self {
        Self { current }
    }

    #[must_use]
    pub const fn current_service_id(&self) -> ServiceId {
        self.current
    }

    pub const fn set_current_service_id(&mut self, service: ServiceId) {
        self.current = service;
    }

    /// Maps a catalogue `name` attribute (e.g. `"myanimelist"`) to a service.
    #[must_use]
    pub fn service_id_by_name(&self, name: &str) -> Option<ServiceId> {
        match name.parse() {
            Ok(service) => Some(service),
            Err(_) => {
                debug!(name, "Unknown service name");
                None
            }
        }
    }
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new(ServiceId::MyAnimeList)
    }
}
