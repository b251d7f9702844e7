//! In-memory stand-in for the platform, used by the integration tests:
//! reads are served from configured data, writes are recorded so tests can
//! assert exactly what reached the backend.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    ArchivoSubido, EstadoSolicitud, NuevaSolicitudCupos, NuevaSolicitudRotacion,
    NuevoEstudianteRotacion, SolicitudCupos, SolicitudRotacion, Usuario, UsuarioCentro,
};

use super::SupabaseClient;

pub struct StubSupabaseClient {
    usuario: Usuario,
    centro: UsuarioCentro,
    solicitudes: Mutex<Vec<SolicitudCupos>>,
    rotaciones: Mutex<Vec<SolicitudRotacion>>,
    estudiantes: Mutex<Vec<NuevoEstudianteRotacion>>,
    archivos: Mutex<Vec<ArchivoSubido>>,
    escrituras: AtomicUsize,
    falla_estudiantes: bool,
    demora_subida: Duration,
}

impl StubSupabaseClient {
    pub fn new(centro: UsuarioCentro) -> Self {
        let usuario = Usuario {
            id: centro.user_id,
            email: Some("coordinacion@centro.cl".to_string()),
            nombre_completo: Some("Coordinación Campos Clínicos".to_string()),
        };
        Self {
            usuario,
            centro,
            solicitudes: Mutex::new(Vec::new()),
            rotaciones: Mutex::new(Vec::new()),
            estudiantes: Mutex::new(Vec::new()),
            archivos: Mutex::new(Vec::new()),
            escrituras: AtomicUsize::new(0),
            falla_estudiantes: false,
            demora_subida: Duration::ZERO,
        }
    }

    pub fn con_solicitudes(self, solicitudes: Vec<SolicitudCupos>) -> Self {
        *lock(&self.solicitudes) = solicitudes;
        self
    }

    /// Makes the student batch insert fail, to exercise the pipeline's
    /// behavior when the request row is already committed.
    pub fn con_falla_en_estudiantes(mut self) -> Self {
        self.falla_estudiantes = true;
        self
    }

    pub fn con_demora_subida(mut self, demora: Duration) -> Self {
        self.demora_subida = demora;
        self
    }

    pub fn solicitudes(&self) -> Vec<SolicitudCupos> {
        lock(&self.solicitudes).clone()
    }

    pub fn rotaciones(&self) -> Vec<SolicitudRotacion> {
        lock(&self.rotaciones).clone()
    }

    pub fn estudiantes(&self) -> Vec<NuevoEstudianteRotacion> {
        lock(&self.estudiantes).clone()
    }

    pub fn archivos(&self) -> Vec<ArchivoSubido> {
        lock(&self.archivos).clone()
    }

    /// Total writes (inserts and uploads) that reached the stub.
    pub fn escrituras(&self) -> usize {
        self.escrituras.load(Ordering::SeqCst)
    }

    /// Simulates the hospital resolving a request, as the platform's
    /// realtime channel would report it.
    pub fn actualizar_estado(
        &self,
        solicitud_id: Uuid,
        estado: EstadoSolicitud,
        motivo_rechazo: Option<String>,
    ) {
        let mut solicitudes = lock(&self.solicitudes);
        if let Some(solicitud) = solicitudes.iter_mut().find(|s| s.id == solicitud_id) {
            solicitud.estado = estado;
            solicitud.motivo_rechazo = motivo_rechazo;
        }
    }
}

#[async_trait]
impl SupabaseClient for StubSupabaseClient {
    async fn get_user(&self, _access_token: &str) -> Result<Usuario, AppError> {
        Ok(self.usuario.clone())
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn fetch_usuario_centro(
        &self,
        _access_token: &str,
        user_id: Uuid,
    ) -> Result<Option<UsuarioCentro>, AppError> {
        if user_id == self.centro.user_id {
            Ok(Some(self.centro.clone()))
        } else {
            Ok(None)
        }
    }

    async fn fetch_solicitudes_cupos(
        &self,
        _access_token: &str,
        centro_id: Uuid,
    ) -> Result<Vec<SolicitudCupos>, AppError> {
        let mut filas: Vec<SolicitudCupos> = lock(&self.solicitudes)
            .iter()
            .filter(|s| s.centro_formador_id == centro_id)
            .cloned()
            .collect();
        filas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(filas)
    }

    async fn fetch_solicitud_cupos(
        &self,
        _access_token: &str,
        solicitud_id: Uuid,
    ) -> Result<Option<SolicitudCupos>, AppError> {
        Ok(lock(&self.solicitudes)
            .iter()
            .find(|s| s.id == solicitud_id)
            .cloned())
    }

    async fn insert_solicitud_cupos(
        &self,
        _access_token: &str,
        nueva: &NuevaSolicitudCupos,
    ) -> Result<SolicitudCupos, AppError> {
        self.escrituras.fetch_add(1, Ordering::SeqCst);
        let solicitud = SolicitudCupos {
            id: Uuid::new_v4(),
            centro_formador_id: nueva.centro_formador_id,
            especialidad: nueva.especialidad.clone(),
            numero_cupos: nueva.numero_cupos,
            fecha_inicio: nueva.fecha_inicio,
            fecha_termino: nueva.fecha_termino,
            solicitante: nueva.solicitante.clone(),
            comentarios: nueva.comentarios.clone(),
            estado: nueva.estado,
            motivo_rechazo: None,
            fecha_solicitud: nueva.fecha_solicitud,
            created_at: Utc::now(),
        };
        lock(&self.solicitudes).push(solicitud.clone());
        Ok(solicitud)
    }

    async fn insert_solicitud_rotacion(
        &self,
        _access_token: &str,
        nueva: &NuevaSolicitudRotacion,
    ) -> Result<SolicitudRotacion, AppError> {
        self.escrituras.fetch_add(1, Ordering::SeqCst);
        let solicitud = SolicitudRotacion {
            id: Uuid::new_v4(),
            centro_formador_id: nueva.centro_formador_id,
            especialidad: nueva.especialidad.clone(),
            fecha_inicio: nueva.fecha_inicio,
            fecha_termino: nueva.fecha_termino,
            comentarios: nueva.comentarios.clone(),
            archivo_excel_url: nueva.archivo_excel_url.clone(),
            archivo_excel_nombre: nueva.archivo_excel_nombre.clone(),
            estado: nueva.estado,
            fecha_solicitud: nueva.fecha_solicitud,
            created_at: Utc::now(),
        };
        lock(&self.rotaciones).push(solicitud.clone());
        Ok(solicitud)
    }

    async fn insert_estudiantes_rotacion(
        &self,
        _access_token: &str,
        estudiantes: &[NuevoEstudianteRotacion],
    ) -> Result<(), AppError> {
        self.escrituras.fetch_add(1, Ordering::SeqCst);
        if self.falla_estudiantes {
            return Err(AppError::Persistence(
                "permission denied for table estudiantes_rotacion".to_string(),
            ));
        }
        lock(&self.estudiantes).extend_from_slice(estudiantes);
        Ok(())
    }

    async fn upload_planilla(
        &self,
        _access_token: &str,
        centro_id: Uuid,
        nombre: &str,
        _content_type: &str,
        _datos: Vec<u8>,
    ) -> Result<ArchivoSubido, AppError> {
        if self.demora_subida > Duration::ZERO {
            tokio::time::sleep(self.demora_subida).await;
        }
        self.escrituras.fetch_add(1, Ordering::SeqCst);
        let subido = ArchivoSubido {
            url: format!("https://stub.local/storage/{}/{}", centro_id, nombre),
            nombre: nombre.to_string(),
        };
        lock(&self.archivos).push(subido.clone());
        Ok(subido)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
