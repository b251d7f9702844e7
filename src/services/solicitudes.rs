use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{EstadoSolicitud, ResumenSolicitudes, SolicitudCupos};
use crate::supabase::SupabaseClient;

#[derive(Debug, Serialize)]
pub struct ListadoSolicitudes {
    pub resumen: ResumenSolicitudes,
    pub solicitudes: Vec<SolicitudCupos>,
}

pub struct SolicitudesService {
    supabase: Arc<dyn SupabaseClient>,
}

impl SolicitudesService {
    pub fn new(supabase: Arc<dyn SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Newest-first list for the center. The tallies always cover the full
    /// set; the status filter is applied to the rows already fetched, not
    /// re-queried.
    pub async fn listar(
        &self,
        access_token: &str,
        centro_id: Uuid,
        filtro: Option<EstadoSolicitud>,
    ) -> Result<ListadoSolicitudes, AppError> {
        let solicitudes = self
            .supabase
            .fetch_solicitudes_cupos(access_token, centro_id)
            .await?;
        let resumen = ResumenSolicitudes::contar(&solicitudes);

        let solicitudes = match filtro {
            Some(estado) => solicitudes
                .into_iter()
                .filter(|s| s.estado == estado)
                .collect(),
            None => solicitudes,
        };

        Ok(ListadoSolicitudes {
            resumen,
            solicitudes,
        })
    }

    /// Read-only single fetch backing the detail view.
    pub async fn detalle(
        &self,
        access_token: &str,
        centro_id: Uuid,
        solicitud_id: Uuid,
    ) -> Result<SolicitudCupos, AppError> {
        let solicitud = self
            .supabase
            .fetch_solicitud_cupos(access_token, solicitud_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if solicitud.centro_formador_id != centro_id {
            return Err(AppError::NotFound);
        }
        Ok(solicitud)
    }
}
