use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::error::AppError;
use crate::models::{
    EstadoSolicitud, FormSolicitudCupos, NuevaSolicitudCupos, SolicitudCupos, UsuarioCentro,
};
use crate::supabase::SupabaseClient;

pub struct CuposService {
    supabase: Arc<dyn SupabaseClient>,
}

impl CuposService {
    pub fn new(supabase: Arc<dyn SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Validates and submits a slot request. Validation runs in full before
    /// anything is written; the available-slot ceiling is the one read when
    /// the form was loaded.
    pub async fn enviar(
        &self,
        access_token: &str,
        centro: &UsuarioCentro,
        form: FormSolicitudCupos,
    ) -> Result<SolicitudCupos, AppError> {
        let disponibles = centro.centro_formador.cupos_disponibles;

        if form.especialidad.trim().is_empty() {
            return Err(AppError::Validation(
                "Debes seleccionar una especialidad".to_string(),
            ));
        }

        let (Some(fecha_inicio), Some(fecha_termino)) = (form.fecha_inicio, form.fecha_termino)
        else {
            return Err(AppError::Validation(
                "Debes especificar las fechas de inicio y término".to_string(),
            ));
        };

        if fecha_termino <= fecha_inicio {
            return Err(AppError::Validation(
                "La fecha de término debe ser posterior a la fecha de inicio".to_string(),
            ));
        }

        if form.numero_cupos > disponibles {
            return Err(AppError::Validation(format!(
                "No puedes solicitar más cupos de los disponibles. Tienes {disponibles} cupos disponibles."
            )));
        }

        if form.numero_cupos <= 0 {
            return Err(AppError::Validation(
                "Debes solicitar al menos 1 cupo".to_string(),
            ));
        }

        let nueva = NuevaSolicitudCupos {
            centro_formador_id: centro.centro_formador_id,
            especialidad: form.especialidad,
            numero_cupos: form.numero_cupos,
            fecha_inicio,
            fecha_termino,
            solicitante: form.solicitante.filter(|s| !s.trim().is_empty()),
            comentarios: form.comentarios.filter(|c| !c.trim().is_empty()),
            estado: EstadoSolicitud::Pendiente,
            fecha_solicitud: Utc::now().date_naive(),
        };

        let solicitud = self.supabase.insert_solicitud_cupos(access_token, &nueva).await?;
        info!(
            "solicitud de cupos {} creada para centro {} ({} cupos)",
            solicitud.id, centro.centro_formador_id, solicitud.numero_cupos
        );
        Ok(solicitud)
    }
}
