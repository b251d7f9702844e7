use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroFormador {
    pub id: Uuid,
    pub nombre: String,
    #[serde(default)]
    pub cupos_totales: i32,
    #[serde(default)]
    pub cupos_disponibles: i32,
}

/// Row of `usuarios_centros` with the embedded center, as returned by
/// `select=*,centro_formador:centros_formadores(*)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsuarioCentro {
    pub id: Uuid,
    pub user_id: Uuid,
    pub centro_formador_id: Uuid,
    pub centro_formador: CentroFormador,
}

/// Authenticated user as reported by the platform's auth API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usuario {
    pub id: Uuid,
    pub email: Option<String>,
    pub nombre_completo: Option<String>,
}
