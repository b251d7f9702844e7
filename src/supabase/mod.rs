pub mod dto;
pub mod stub;

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    ArchivoSubido, NuevaSolicitudCupos, NuevaSolicitudRotacion, NuevoEstudianteRotacion,
    SolicitudCupos, SolicitudRotacion, Usuario, UsuarioCentro,
};

pub use stub::StubSupabaseClient;

/// Stalled platform calls fail after this long instead of hanging the
/// submission forever.
const TIMEOUT_PLATAFORMA: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub storage_bucket: String,
}

impl SupabaseConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let url = env::var("SUPABASE_URL")
            .map_err(|_| AppError::Validation("SUPABASE_URL is not set".to_string()))?;
        let anon_key = env::var("SUPABASE_ANON_KEY")
            .map_err(|_| AppError::Validation("SUPABASE_ANON_KEY is not set".to_string()))?;
        let storage_bucket =
            env::var("SUPABASE_STORAGE_BUCKET").unwrap_or_else(|_| "planillas".to_string());

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            storage_bucket,
        })
    }
}

/// The slice of the platform the portal uses: the auth API, the table API
/// and object storage. Every call runs under the caller's access token so
/// the platform's row-level rules stay in charge.
#[async_trait]
pub trait SupabaseClient: Send + Sync {
    async fn get_user(&self, access_token: &str) -> Result<Usuario, AppError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;

    async fn fetch_usuario_centro(
        &self,
        access_token: &str,
        user_id: Uuid,
    ) -> Result<Option<UsuarioCentro>, AppError>;

    async fn fetch_solicitudes_cupos(
        &self,
        access_token: &str,
        centro_id: Uuid,
    ) -> Result<Vec<SolicitudCupos>, AppError>;

    async fn fetch_solicitud_cupos(
        &self,
        access_token: &str,
        solicitud_id: Uuid,
    ) -> Result<Option<SolicitudCupos>, AppError>;

    async fn insert_solicitud_cupos(
        &self,
        access_token: &str,
        nueva: &NuevaSolicitudCupos,
    ) -> Result<SolicitudCupos, AppError>;

    async fn insert_solicitud_rotacion(
        &self,
        access_token: &str,
        nueva: &NuevaSolicitudRotacion,
    ) -> Result<SolicitudRotacion, AppError>;

    async fn insert_estudiantes_rotacion(
        &self,
        access_token: &str,
        estudiantes: &[NuevoEstudianteRotacion],
    ) -> Result<(), AppError>;

    async fn upload_planilla(
        &self,
        access_token: &str,
        centro_id: Uuid,
        nombre: &str,
        content_type: &str,
        datos: Vec<u8>,
    ) -> Result<ArchivoSubido, AppError>;
}

pub struct SupabaseHttpClient {
    client: Client,
    config: SupabaseConfig,
}

impl SupabaseHttpClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(TIMEOUT_PLATAFORMA)
            .build()
            .map_err(|e| AppError::Validation(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn rest_url(&self, tabla: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url, tabla)
    }

    fn auth_url(&self, recurso: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, recurso)
    }

    async fn fetch_rows<T: serde::de::DeserializeOwned>(
        &self,
        access_token: &str,
        tabla: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, AppError> {
        let response = self
            .client
            .get(self.rest_url(tabla))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::Persistence(format!("Error de red al consultar {tabla}: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Persistence(mensaje_error(response).await));
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| AppError::Parse(format!("Respuesta inválida de {tabla}: {e}")))
    }

    async fn insert_rows<B, T>(
        &self,
        access_token: &str,
        tabla: &str,
        body: &B,
        representation: bool,
    ) -> Result<Vec<T>, AppError>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let prefer = if representation {
            "return=representation"
        } else {
            "return=minimal"
        };

        let response = self
            .client
            .post(self.rest_url(tabla))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .header("Prefer", prefer)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Persistence(format!("Error de red al escribir en {tabla}: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Persistence(mensaje_error(response).await));
        }

        if !representation {
            return Ok(Vec::new());
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| AppError::Parse(format!("Respuesta inválida de {tabla}: {e}")))
    }
}

#[async_trait]
impl SupabaseClient for SupabaseHttpClient {
    async fn get_user(&self, access_token: &str) -> Result<Usuario, AppError> {
        let response = self
            .client
            .get(self.auth_url("user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                warn!("auth request failed: {}", e);
                AppError::Internal
            })?;

        if !response.status().is_success() {
            return Err(AppError::Auth("Sesión no válida o expirada".to_string()));
        }

        let usuario: dto::AuthUserResponse = response
            .json()
            .await
            .map_err(|e| AppError::Parse(format!("Respuesta de autenticación inválida: {e}")))?;

        Ok(Usuario {
            id: usuario.id,
            email: usuario.email,
            nombre_completo: usuario.user_metadata.nombre_completo,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let response = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                warn!("logout request failed: {}", e);
                AppError::Internal
            })?;

        // The session is discarded either way; a rejected logout only means
        // the token was already dead.
        if !response.status().is_success() {
            warn!("logout rejected: {}", response.status());
        }
        Ok(())
    }

    async fn fetch_usuario_centro(
        &self,
        access_token: &str,
        user_id: Uuid,
    ) -> Result<Option<UsuarioCentro>, AppError> {
        let filas: Vec<UsuarioCentro> = self
            .fetch_rows(
                access_token,
                "usuarios_centros",
                &[
                    ("select", "*,centro_formador:centros_formadores(*)".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(filas.into_iter().next())
    }

    async fn fetch_solicitudes_cupos(
        &self,
        access_token: &str,
        centro_id: Uuid,
    ) -> Result<Vec<SolicitudCupos>, AppError> {
        self.fetch_rows(
            access_token,
            "solicitudes_cupos",
            &[
                ("select", "*".to_string()),
                ("centro_formador_id", format!("eq.{centro_id}")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn fetch_solicitud_cupos(
        &self,
        access_token: &str,
        solicitud_id: Uuid,
    ) -> Result<Option<SolicitudCupos>, AppError> {
        let filas: Vec<SolicitudCupos> = self
            .fetch_rows(
                access_token,
                "solicitudes_cupos",
                &[
                    ("select", "*".to_string()),
                    ("id", format!("eq.{solicitud_id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(filas.into_iter().next())
    }

    async fn insert_solicitud_cupos(
        &self,
        access_token: &str,
        nueva: &NuevaSolicitudCupos,
    ) -> Result<SolicitudCupos, AppError> {
        let filas: Vec<SolicitudCupos> = self
            .insert_rows(access_token, "solicitudes_cupos", &[nueva], true)
            .await?;
        filas.into_iter().next().ok_or_else(|| {
            AppError::Persistence("El backend no devolvió la solicitud creada".to_string())
        })
    }

    async fn insert_solicitud_rotacion(
        &self,
        access_token: &str,
        nueva: &NuevaSolicitudRotacion,
    ) -> Result<SolicitudRotacion, AppError> {
        let filas: Vec<SolicitudRotacion> = self
            .insert_rows(access_token, "solicitudes_rotacion", &[nueva], true)
            .await?;
        filas.into_iter().next().ok_or_else(|| {
            AppError::Persistence("El backend no devolvió la solicitud creada".to_string())
        })
    }

    async fn insert_estudiantes_rotacion(
        &self,
        access_token: &str,
        estudiantes: &[NuevoEstudianteRotacion],
    ) -> Result<(), AppError> {
        self.insert_rows::<_, serde_json::Value>(
            access_token,
            "estudiantes_rotacion",
            estudiantes,
            false,
        )
        .await?;
        Ok(())
    }

    async fn upload_planilla(
        &self,
        access_token: &str,
        centro_id: Uuid,
        nombre: &str,
        content_type: &str,
        datos: Vec<u8>,
    ) -> Result<ArchivoSubido, AppError> {
        // Center-namespaced key; the uuid keeps retried uploads on distinct
        // paths, so collisions across centers cannot happen.
        let clave = format!("{}/{}_{}", centro_id, Uuid::new_v4(), sanitizar_nombre(nombre));
        let destino = format!(
            "{}/storage/v1/object/{}/{}",
            self.config.url, self.config.storage_bucket, clave
        );

        let response = self
            .client
            .post(&destino)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(datos)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Error al subir el archivo: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(mensaje_error(response).await));
        }

        Ok(ArchivoSubido {
            url: format!(
                "{}/storage/v1/object/public/{}/{}",
                self.config.url, self.config.storage_bucket, clave
            ),
            nombre: nombre.to_string(),
        })
    }
}

/// Extracts the platform's own error message when the body carries one,
/// falling back to the raw status and body.
async fn mensaje_error(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if let Ok(parsed) = serde_json::from_str::<dto::ApiErrorResponse>(&body) {
        if let Some(mensaje) = parsed.mensaje() {
            return mensaje;
        }
    }
    format!("Error {}: {}", status, body)
}

fn sanitizar_nombre(nombre: &str) -> String {
    nombre
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizar_nombre_reemplaza_caracteres_raros() {
        assert_eq!(sanitizar_nombre("lista final.xlsx"), "lista_final.xlsx");
        assert_eq!(sanitizar_nombre("año-2025 (v2).xls"), "a_o-2025__v2_.xls");
        assert_eq!(sanitizar_nombre("simple.xlsx"), "simple.xlsx");
    }
}
