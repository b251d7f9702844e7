use std::sync::Arc;
use std::time::Duration;

use crate::services::RotacionService;
use crate::supabase::SupabaseClient;

#[derive(Clone)]
pub struct AppState {
    pub supabase: Arc<dyn SupabaseClient>,
    /// Shared so the per-center in-flight guard spans all connections.
    pub rotacion: Arc<RotacionService>,
    /// Polling cadence of the request-list watcher.
    pub intervalo_eventos: Duration,
}

impl AppState {
    pub fn new(supabase: Arc<dyn SupabaseClient>) -> Self {
        Self {
            rotacion: Arc::new(RotacionService::new(supabase.clone())),
            supabase,
            intervalo_eventos: Duration::from_secs(5),
        }
    }
}
