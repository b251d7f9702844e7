use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One student row parsed from the roster spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstudianteFila {
    pub rut: String,
    pub nombre: String,
    pub apellido: String,
    pub email: Option<String>,
}

/// Insert payload for `estudiantes_rotacion`, tied to its parent request.
#[derive(Debug, Clone, Serialize)]
pub struct NuevoEstudianteRotacion {
    pub solicitud_rotacion_id: Uuid,
    pub rut: String,
    pub nombre: String,
    pub apellido: String,
    pub email: Option<String>,
}

impl NuevoEstudianteRotacion {
    pub fn de_fila(solicitud_rotacion_id: Uuid, fila: EstudianteFila) -> Self {
        Self {
            solicitud_rotacion_id,
            rut: fila.rut,
            nombre: fila.nombre,
            apellido: fila.apellido,
            email: fila.email,
        }
    }
}
