use std::convert::Infallible;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    ArchivoPlanilla, CentroFormador, EstadoSolicitud, FormSolicitudCupos, FormSolicitudRotacion,
    NivelFormacion, ResumenSolicitudes, SolicitudCupos, SolicitudRotacion, Usuario, UsuarioCentro,
    especialidades,
};
use crate::roster::{self, PlanillaParseada};
use crate::services::{CuposService, ListadoSolicitudes, SolicitudesService, SolicitudesWatcher};
use crate::state::AppState;

/// Multipart bodies carry the 5 MB roster plus the form fields.
const LIMITE_CUERPO: usize = 6 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/dashboard", get(dashboard))
        .route("/especialidades", get(listar_especialidades))
        .route("/solicitudes", get(listar_solicitudes))
        .route("/solicitudes/events", get(eventos_solicitudes))
        .route("/solicitudes/cupos", post(crear_solicitud_cupos))
        .route("/solicitudes/rotacion", post(crear_solicitud_rotacion))
        .route("/solicitudes/rotacion/previsualizar", post(previsualizar_planilla))
        .route("/solicitudes/rotacion/plantilla", get(descargar_plantilla))
        .route("/solicitudes/{id}", get(detalle_solicitud))
        .route("/logout", post(logout))
        .layer(DefaultBodyLimit::max(LIMITE_CUERPO))
        .with_state(state)
}

/// Session resolved for the request: the views all start by checking who is
/// signed in and which center they belong to.
struct Sesion {
    token: String,
    usuario: Usuario,
    centro: UsuarioCentro,
}

async fn sesion(state: &AppState, headers: &HeaderMap) -> Result<Sesion, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|valor| valor.to_str().ok())
        .and_then(|valor| valor.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or_else(|| AppError::Auth("Debes iniciar sesión".to_string()))?;

    let usuario = state.supabase.get_user(&token).await?;
    let centro = state
        .supabase
        .fetch_usuario_centro(&token, usuario.id)
        .await?
        .ok_or_else(|| {
            AppError::Auth(
                "No se encontró tu centro formador. Por favor contacta al administrador."
                    .to_string(),
            )
        })?;

    Ok(Sesion {
        token,
        usuario,
        centro,
    })
}

async fn health() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize)]
struct DashboardView {
    centro: CentroFormador,
    resumen: ResumenSolicitudes,
    solicitudes: Vec<SolicitudCupos>,
}

async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardView>, AppError> {
    let sesion = sesion(&state, &headers).await?;
    let listado = SolicitudesService::new(state.supabase.clone())
        .listar(&sesion.token, sesion.centro.centro_formador_id, None)
        .await?;

    Ok(Json(DashboardView {
        centro: sesion.centro.centro_formador,
        resumen: listado.resumen,
        solicitudes: listado.solicitudes,
    }))
}

#[derive(Deserialize)]
struct EspecialidadesParams {
    nivel: Option<NivelFormacion>,
}

#[derive(Serialize)]
struct EspecialidadesView {
    nivel: NivelFormacion,
    especialidades: &'static [&'static str],
}

async fn listar_especialidades(
    Query(params): Query<EspecialidadesParams>,
) -> Json<EspecialidadesView> {
    let nivel = params.nivel.unwrap_or(NivelFormacion::Pregrado);
    Json(EspecialidadesView {
        nivel,
        especialidades: especialidades(nivel),
    })
}

#[derive(Deserialize)]
struct SolicitudesParams {
    estado: Option<EstadoSolicitud>,
}

async fn listar_solicitudes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SolicitudesParams>,
) -> Result<Json<ListadoSolicitudes>, AppError> {
    let sesion = sesion(&state, &headers).await?;
    let listado = SolicitudesService::new(state.supabase.clone())
        .listar(&sesion.token, sesion.centro.centro_formador_id, params.estado)
        .await?;
    Ok(Json(listado))
}

async fn detalle_solicitud(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<SolicitudCupos>, AppError> {
    let sesion = sesion(&state, &headers).await?;
    let solicitud = SolicitudesService::new(state.supabase.clone())
        .detalle(&sesion.token, sesion.centro.centro_formador_id, id)
        .await?;
    Ok(Json(solicitud))
}

async fn eventos_solicitudes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let sesion = sesion(&state, &headers).await?;
    let watcher = SolicitudesWatcher::new(
        state.supabase.clone(),
        sesion.token,
        sesion.centro.centro_formador_id,
        state.intervalo_eventos,
    );

    let stream = watcher.eventos().map(|cambio| {
        let evento = Event::default().event("solicitudes");
        let evento = match serde_json::to_string(&cambio) {
            Ok(json) => evento.data(json),
            Err(_) => evento.data("{}"),
        };
        Ok::<_, Infallible>(evento)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn crear_solicitud_cupos(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut form): Json<FormSolicitudCupos>,
) -> Result<(StatusCode, Json<SolicitudCupos>), AppError> {
    let sesion = sesion(&state, &headers).await?;

    // The requester name defaults to the signed-in user's profile, as the
    // form pre-filled it.
    if form.solicitante.is_none() {
        form.solicitante = sesion.usuario.nombre_completo.clone();
    }

    let solicitud = CuposService::new(state.supabase.clone())
        .enviar(&sesion.token, &sesion.centro, form)
        .await?;
    Ok((StatusCode::CREATED, Json(solicitud)))
}

#[derive(Serialize)]
struct EnvioRotacionView {
    solicitud: SolicitudRotacion,
    total_estudiantes: usize,
}

async fn crear_solicitud_rotacion(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<EnvioRotacionView>), AppError> {
    let sesion = sesion(&state, &headers).await?;
    let (form, archivo) = leer_formulario_rotacion(&mut multipart).await?;
    let archivo = archivo.ok_or_else(archivo_faltante)?;

    let envio = state
        .rotacion
        .enviar(&sesion.token, &sesion.centro, form, archivo)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(EnvioRotacionView {
            solicitud: envio.solicitud,
            total_estudiantes: envio.total_estudiantes,
        }),
    ))
}

async fn previsualizar_planilla(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<PlanillaParseada>, AppError> {
    sesion(&state, &headers).await?;
    let (_, archivo) = leer_formulario_rotacion(&mut multipart).await?;
    let archivo = archivo.ok_or_else(archivo_faltante)?;
    let planilla = state.rotacion.previsualizar(&archivo)?;
    Ok(Json(planilla))
}

async fn descargar_plantilla() -> Result<impl IntoResponse, AppError> {
    let datos = roster::generar_plantilla()?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", roster::NOMBRE_PLANTILLA),
            ),
        ],
        datos,
    ))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let sesion = sesion(&state, &headers).await?;
    state.supabase.sign_out(&sesion.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn leer_formulario_rotacion(
    multipart: &mut Multipart,
) -> Result<(FormSolicitudRotacion, Option<ArchivoPlanilla>), AppError> {
    let mut form = FormSolicitudRotacion::default();
    let mut archivo = None;

    while let Some(field) = multipart.next_field().await.map_err(formulario_invalido)? {
        let campo = field.name().unwrap_or_default().to_string();
        match campo.as_str() {
            "especialidad" => {
                form.especialidad = field.text().await.map_err(formulario_invalido)?;
            }
            "fecha_inicio" => {
                let texto = field.text().await.map_err(formulario_invalido)?;
                if !texto.trim().is_empty() {
                    form.fecha_inicio = Some(leer_fecha(&texto)?);
                }
            }
            "fecha_termino" => {
                let texto = field.text().await.map_err(formulario_invalido)?;
                if !texto.trim().is_empty() {
                    form.fecha_termino = Some(leer_fecha(&texto)?);
                }
            }
            "comentarios" => {
                let texto = field.text().await.map_err(formulario_invalido)?;
                if !texto.trim().is_empty() {
                    form.comentarios = Some(texto);
                }
            }
            "archivo" => {
                let nombre = field.file_name().unwrap_or("planilla.xlsx").to_string();
                let content_type = field.content_type().map(str::to_string);
                let datos = field.bytes().await.map_err(formulario_invalido)?.to_vec();
                archivo = Some(ArchivoPlanilla {
                    nombre,
                    content_type,
                    datos,
                });
            }
            _ => {}
        }
    }

    Ok((form, archivo))
}

fn leer_fecha(texto: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(texto.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Fecha inválida: {texto}")))
}

fn formulario_invalido(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Formulario inválido: {err}"))
}

fn archivo_faltante() -> AppError {
    AppError::Validation("Debes adjuntar la planilla de estudiantes en formato Excel".to_string())
}
