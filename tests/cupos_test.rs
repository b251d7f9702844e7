use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use portal_centros::error::AppError;
use portal_centros::models::{
    CentroFormador, EstadoSolicitud, FormSolicitudCupos, UsuarioCentro,
};
use portal_centros::services::CuposService;
use portal_centros::supabase::StubSupabaseClient;

fn centro_de_prueba(disponibles: i32) -> UsuarioCentro {
    let centro_id = Uuid::new_v4();
    UsuarioCentro {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        centro_formador_id: centro_id,
        centro_formador: CentroFormador {
            id: centro_id,
            nombre: "Instituto de Salud Austral".to_string(),
            cupos_totales: 20,
            cupos_disponibles: disponibles,
        },
    }
}

fn fecha(texto: &str) -> NaiveDate {
    NaiveDate::parse_from_str(texto, "%Y-%m-%d").expect("fecha de prueba inválida")
}

fn form_valido() -> FormSolicitudCupos {
    FormSolicitudCupos {
        especialidad: "Enfermería".to_string(),
        numero_cupos: 3,
        fecha_inicio: Some(fecha("2026-09-01")),
        fecha_termino: Some(fecha("2026-12-15")),
        solicitante: Some("Carla Muñoz".to_string()),
        comentarios: Some("Rotación de práctica clínica".to_string()),
    }
}

#[tokio::test]
async fn crea_solicitud_pendiente() {
    let centro = centro_de_prueba(5);
    let stub = Arc::new(StubSupabaseClient::new(centro.clone()));
    let service = CuposService::new(stub.clone());

    let solicitud = service
        .enviar("token", &centro, form_valido())
        .await
        .expect("la solicitud debía crearse");

    assert_eq!(solicitud.estado, EstadoSolicitud::Pendiente);
    assert_eq!(solicitud.numero_cupos, 3);
    assert_eq!(solicitud.centro_formador_id, centro.centro_formador_id);
    assert_eq!(solicitud.fecha_solicitud, Utc::now().date_naive());
    assert_eq!(solicitud.solicitante.as_deref(), Some("Carla Muñoz"));

    let guardadas = stub.solicitudes();
    assert_eq!(guardadas.len(), 1);
    assert_eq!(guardadas[0].id, solicitud.id);
}

#[tokio::test]
async fn rechaza_mas_cupos_que_los_disponibles() {
    let centro = centro_de_prueba(5);
    let stub = Arc::new(StubSupabaseClient::new(centro.clone()));
    let service = CuposService::new(stub.clone());

    let mut form = form_valido();
    form.numero_cupos = 10;

    let error = service.enviar("token", &centro, form).await.unwrap_err();
    match error {
        AppError::Validation(mensaje) => {
            assert!(mensaje.contains("5 cupos disponibles"), "mensaje: {mensaje}")
        }
        otro => panic!("se esperaba un error de validación, no {otro:?}"),
    }
    assert_eq!(stub.escrituras(), 0, "no debía llegar ninguna escritura al backend");
}

#[tokio::test]
async fn rechaza_numero_de_cupos_no_positivo() {
    let centro = centro_de_prueba(5);
    let stub = Arc::new(StubSupabaseClient::new(centro.clone()));
    let service = CuposService::new(stub.clone());

    for numero_cupos in [0, -2] {
        let mut form = form_valido();
        form.numero_cupos = numero_cupos;
        let error = service.enviar("token", &centro, form).await.unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
    }
    assert_eq!(stub.escrituras(), 0);
}

#[tokio::test]
async fn rechaza_fecha_de_termino_no_posterior() {
    let centro = centro_de_prueba(5);
    let stub = Arc::new(StubSupabaseClient::new(centro.clone()));
    let service = CuposService::new(stub.clone());

    // End before start, and end equal to start.
    for termino in ["2026-08-01", "2026-09-01"] {
        let mut form = form_valido();
        form.fecha_termino = Some(fecha(termino));
        let error = service.enviar("token", &centro, form).await.unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
    }
    assert_eq!(stub.escrituras(), 0);
}

#[tokio::test]
async fn rechaza_formulario_incompleto() {
    let centro = centro_de_prueba(5);
    let stub = Arc::new(StubSupabaseClient::new(centro.clone()));
    let service = CuposService::new(stub.clone());

    let mut sin_especialidad = form_valido();
    sin_especialidad.especialidad = "  ".to_string();
    let error = service
        .enviar("token", &centro, sin_especialidad)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Validation(_)));

    let mut sin_fechas = form_valido();
    sin_fechas.fecha_inicio = None;
    let error = service
        .enviar("token", &centro, sin_fechas)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Validation(_)));

    assert_eq!(stub.escrituras(), 0);
}
