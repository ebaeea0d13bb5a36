use std::sync::Arc;

use famcal_core::FamilyCalendar;
use famcal_core::auth::AuthMachine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub family: FamilyCalendar,
    pub auth: Arc<AuthMachine>,
}

impl AppState {
    pub fn new(family: FamilyCalendar, auth: AuthMachine) -> Self {
        AppState {
            family,
            auth: Arc::new(auth),
        }
    }
}
