//! Rotation-request submission pipeline.
//!
//! One submission walks through validation, the roster upload, the request
//! insert and the student batch insert, strictly in that order; the
//! request id generated by the backend is what ties the students to it.
//! A failure at any step halts the pipeline there. There is no rollback:
//! if the student insert fails after the request row was committed, the
//! row stays behind without students and the error is surfaced as-is.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    ArchivoPlanilla, EstadoSolicitud, FormSolicitudRotacion, NuevaSolicitudRotacion,
    NuevoEstudianteRotacion, SolicitudRotacion, UsuarioCentro,
};
use crate::roster::{self, PlanillaParseada, parse_estudiantes};
use crate::supabase::SupabaseClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtapaEnvio {
    Validacion,
    SubidaArchivo,
    CreacionSolicitud,
    RegistroEstudiantes,
}

impl fmt::Display for EtapaEnvio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nombre = match self {
            EtapaEnvio::Validacion => "validación",
            EtapaEnvio::SubidaArchivo => "subida de archivo",
            EtapaEnvio::CreacionSolicitud => "creación de solicitud",
            EtapaEnvio::RegistroEstudiantes => "registro de estudiantes",
        };
        write!(f, "{nombre}")
    }
}

#[derive(Debug, Clone)]
pub struct EnvioRotacion {
    pub solicitud: SolicitudRotacion,
    pub total_estudiantes: usize,
}

pub struct RotacionService {
    supabase: Arc<dyn SupabaseClient>,
    en_curso: Mutex<HashSet<Uuid>>,
}

impl RotacionService {
    pub fn new(supabase: Arc<dyn SupabaseClient>) -> Self {
        Self {
            supabase,
            en_curso: Mutex::new(HashSet::new()),
        }
    }

    /// Checks and parses the uploaded roster without submitting anything;
    /// the portal previews the students right after file selection.
    pub fn previsualizar(&self, archivo: &ArchivoPlanilla) -> Result<PlanillaParseada, AppError> {
        validar_archivo(archivo)?;
        parse_estudiantes(&archivo.datos)
    }

    pub async fn enviar(
        &self,
        access_token: &str,
        centro: &UsuarioCentro,
        form: FormSolicitudRotacion,
        archivo: ArchivoPlanilla,
    ) -> Result<EnvioRotacion, AppError> {
        let _reserva = self.reservar(centro.centro_formador_id)?;

        info!(
            "etapa {}: solicitud de rotación para centro {}",
            EtapaEnvio::Validacion,
            centro.centro_formador_id
        );
        let (Some(fecha_inicio), Some(fecha_termino)) = (form.fecha_inicio, form.fecha_termino)
        else {
            return Err(AppError::Validation(
                "Debes completar todos los campos obligatorios".to_string(),
            ));
        };
        if form.especialidad.trim().is_empty() {
            return Err(AppError::Validation(
                "Debes completar todos los campos obligatorios".to_string(),
            ));
        }
        if fecha_termino <= fecha_inicio {
            return Err(AppError::Validation(
                "La fecha de término debe ser posterior a la fecha de inicio".to_string(),
            ));
        }
        validar_archivo(&archivo)?;
        let planilla = parse_estudiantes(&archivo.datos)?;

        info!(
            "etapa {}: {} ({} bytes)",
            EtapaEnvio::SubidaArchivo,
            archivo.nombre,
            archivo.datos.len()
        );
        let content_type = archivo.content_type.clone().unwrap_or_default();
        let subido = self
            .supabase
            .upload_planilla(
                access_token,
                centro.centro_formador_id,
                &archivo.nombre,
                &content_type,
                archivo.datos,
            )
            .await?;

        info!("etapa {}", EtapaEnvio::CreacionSolicitud);
        let nueva = NuevaSolicitudRotacion {
            centro_formador_id: centro.centro_formador_id,
            especialidad: form.especialidad,
            fecha_inicio,
            fecha_termino,
            comentarios: form.comentarios.filter(|c| !c.trim().is_empty()),
            archivo_excel_url: subido.url,
            archivo_excel_nombre: subido.nombre,
            estado: EstadoSolicitud::Pendiente,
            fecha_solicitud: Utc::now().date_naive(),
        };
        let solicitud = self
            .supabase
            .insert_solicitud_rotacion(access_token, &nueva)
            .await?;

        info!(
            "etapa {}: {} estudiantes para solicitud {}",
            EtapaEnvio::RegistroEstudiantes,
            planilla.total,
            solicitud.id
        );
        let estudiantes: Vec<NuevoEstudianteRotacion> = planilla
            .estudiantes
            .into_iter()
            .map(|fila| NuevoEstudianteRotacion::de_fila(solicitud.id, fila))
            .collect();

        if let Err(err) = self
            .supabase
            .insert_estudiantes_rotacion(access_token, &estudiantes)
            .await
        {
            // No transaction spans the two inserts, so the request row is
            // already committed; leave a trace for reconciliation.
            error!(
                "solicitud de rotación {} quedó sin estudiantes: {}",
                solicitud.id, err
            );
            return Err(err);
        }

        info!(
            "solicitud de rotación {} creada con {} estudiantes",
            solicitud.id,
            estudiantes.len()
        );
        Ok(EnvioRotacion {
            solicitud,
            total_estudiantes: estudiantes.len(),
        })
    }

    fn reservar(&self, centro_id: Uuid) -> Result<ReservaEnvio<'_>, AppError> {
        let mut en_curso = self.en_curso.lock().map_err(|_| AppError::Internal)?;
        if !en_curso.insert(centro_id) {
            return Err(AppError::Conflict(
                "Ya hay un envío en curso para este centro".to_string(),
            ));
        }
        Ok(ReservaEnvio {
            en_curso: &self.en_curso,
            centro_id,
        })
    }
}

/// Releases the per-center submission slot when the pipeline finishes,
/// successfully or not.
struct ReservaEnvio<'a> {
    en_curso: &'a Mutex<HashSet<Uuid>>,
    centro_id: Uuid,
}

impl Drop for ReservaEnvio<'_> {
    fn drop(&mut self) {
        if let Ok(mut en_curso) = self.en_curso.lock() {
            en_curso.remove(&self.centro_id);
        }
    }
}

fn validar_archivo(archivo: &ArchivoPlanilla) -> Result<(), AppError> {
    let tipo = archivo.content_type.as_deref().unwrap_or("");
    if !roster::TIPOS_PERMITIDOS.contains(&tipo) {
        return Err(AppError::Validation(
            "Por favor selecciona un archivo Excel válido (.xls o .xlsx)".to_string(),
        ));
    }
    if archivo.datos.len() > roster::MAX_TAMANO_ARCHIVO {
        return Err(AppError::Validation(
            "El archivo no debe superar los 5MB".to_string(),
        ));
    }
    if archivo.datos.is_empty() {
        return Err(AppError::Validation(
            "Debes adjuntar la planilla de estudiantes en formato Excel".to_string(),
        ));
    }
    Ok(())
}
