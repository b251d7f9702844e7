use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstadoSolicitud {
    Pendiente,
    Aprobada,
    Rechazada,
}

impl EstadoSolicitud {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoSolicitud::Pendiente => "pendiente",
            EstadoSolicitud::Aprobada => "aprobada",
            EstadoSolicitud::Rechazada => "rechazada",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolicitudCupos {
    pub id: Uuid,
    pub centro_formador_id: Uuid,
    pub especialidad: String,
    pub numero_cupos: i32,
    pub fecha_inicio: NaiveDate,
    pub fecha_termino: NaiveDate,
    pub solicitante: Option<String>,
    pub comentarios: Option<String>,
    pub estado: EstadoSolicitud,
    pub motivo_rechazo: Option<String>,
    pub fecha_solicitud: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for `solicitudes_cupos`.
#[derive(Debug, Clone, Serialize)]
pub struct NuevaSolicitudCupos {
    pub centro_formador_id: Uuid,
    pub especialidad: String,
    pub numero_cupos: i32,
    pub fecha_inicio: NaiveDate,
    pub fecha_termino: NaiveDate,
    pub solicitante: Option<String>,
    pub comentarios: Option<String>,
    pub estado: EstadoSolicitud,
    pub fecha_solicitud: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolicitudRotacion {
    pub id: Uuid,
    pub centro_formador_id: Uuid,
    pub especialidad: String,
    pub fecha_inicio: NaiveDate,
    pub fecha_termino: NaiveDate,
    pub comentarios: Option<String>,
    pub archivo_excel_url: String,
    pub archivo_excel_nombre: String,
    pub estado: EstadoSolicitud,
    pub fecha_solicitud: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for `solicitudes_rotacion`.
#[derive(Debug, Clone, Serialize)]
pub struct NuevaSolicitudRotacion {
    pub centro_formador_id: Uuid,
    pub especialidad: String,
    pub fecha_inicio: NaiveDate,
    pub fecha_termino: NaiveDate,
    pub comentarios: Option<String>,
    pub archivo_excel_url: String,
    pub archivo_excel_nombre: String,
    pub estado: EstadoSolicitud,
    pub fecha_solicitud: NaiveDate,
}

/// Status tallies over a center's full request set, independent of the
/// active filter.
#[derive(Debug, Clone, Serialize)]
pub struct ResumenSolicitudes {
    pub total: usize,
    pub pendientes: usize,
    pub aprobadas: usize,
    pub rechazadas: usize,
}

impl ResumenSolicitudes {
    pub fn contar(solicitudes: &[SolicitudCupos]) -> Self {
        let de_estado = |estado: EstadoSolicitud| {
            solicitudes.iter().filter(|s| s.estado == estado).count()
        };
        Self {
            total: solicitudes.len(),
            pendientes: de_estado(EstadoSolicitud::Pendiente),
            aprobadas: de_estado(EstadoSolicitud::Aprobada),
            rechazadas: de_estado(EstadoSolicitud::Rechazada),
        }
    }
}

/// Slot-request form as submitted by the portal frontend. Dates stay
/// optional so missing fields fail with the form's own validation message
/// instead of a deserialization error.
#[derive(Debug, Clone, Deserialize)]
pub struct FormSolicitudCupos {
    #[serde(default)]
    pub especialidad: String,
    #[serde(default = "un_cupo")]
    pub numero_cupos: i32,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_termino: Option<NaiveDate>,
    #[serde(default)]
    pub solicitante: Option<String>,
    #[serde(default)]
    pub comentarios: Option<String>,
}

fn un_cupo() -> i32 {
    1
}

/// Rotation-request form fields, collected from the multipart body.
#[derive(Debug, Clone, Default)]
pub struct FormSolicitudRotacion {
    pub especialidad: String,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_termino: Option<NaiveDate>,
    pub comentarios: Option<String>,
}
