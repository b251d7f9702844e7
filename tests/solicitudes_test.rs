use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use portal_centros::error::AppError;
use portal_centros::models::{
    CentroFormador, EstadoSolicitud, SolicitudCupos, UsuarioCentro,
};
use portal_centros::services::SolicitudesService;
use portal_centros::supabase::StubSupabaseClient;

fn centro_de_prueba() -> UsuarioCentro {
    let centro_id = Uuid::new_v4();
    UsuarioCentro {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        centro_formador_id: centro_id,
        centro_formador: CentroFormador {
            id: centro_id,
            nombre: "Instituto de Salud Austral".to_string(),
            cupos_totales: 20,
            cupos_disponibles: 10,
        },
    }
}

fn fecha(texto: &str) -> NaiveDate {
    NaiveDate::parse_from_str(texto, "%Y-%m-%d").expect("fecha de prueba inválida")
}

fn solicitud(
    centro_id: Uuid,
    estado: EstadoSolicitud,
    hace_segundos: i64,
) -> SolicitudCupos {
    SolicitudCupos {
        id: Uuid::new_v4(),
        centro_formador_id: centro_id,
        especialidad: "Enfermería".to_string(),
        numero_cupos: 2,
        fecha_inicio: fecha("2026-09-01"),
        fecha_termino: fecha("2026-12-15"),
        solicitante: None,
        comentarios: None,
        estado,
        motivo_rechazo: None,
        fecha_solicitud: fecha("2026-08-01"),
        created_at: Utc::now() - Duration::seconds(hace_segundos),
    }
}

#[tokio::test]
async fn lista_ordenada_con_resumen_completo() {
    let centro = centro_de_prueba();
    let centro_id = centro.centro_formador_id;
    let mas_reciente = solicitud(centro_id, EstadoSolicitud::Pendiente, 10);
    let stub = Arc::new(StubSupabaseClient::new(centro.clone()).con_solicitudes(vec![
        solicitud(centro_id, EstadoSolicitud::Aprobada, 300),
        mas_reciente.clone(),
        solicitud(centro_id, EstadoSolicitud::Rechazada, 120),
    ]));
    let service = SolicitudesService::new(stub.clone());

    let listado = service
        .listar("token", centro_id, None)
        .await
        .expect("la lista debía cargarse");

    assert_eq!(listado.solicitudes.len(), 3);
    assert_eq!(listado.solicitudes[0].id, mas_reciente.id, "la más nueva va primero");
    assert_eq!(listado.resumen.total, 3);
    assert_eq!(listado.resumen.pendientes, 1);
    assert_eq!(listado.resumen.aprobadas, 1);
    assert_eq!(listado.resumen.rechazadas, 1);
}

#[tokio::test]
async fn el_filtro_no_altera_el_resumen() {
    let centro = centro_de_prueba();
    let centro_id = centro.centro_formador_id;
    let stub = Arc::new(StubSupabaseClient::new(centro.clone()).con_solicitudes(vec![
        solicitud(centro_id, EstadoSolicitud::Pendiente, 10),
        solicitud(centro_id, EstadoSolicitud::Pendiente, 20),
        solicitud(centro_id, EstadoSolicitud::Aprobada, 30),
    ]));
    let service = SolicitudesService::new(stub.clone());

    let listado = service
        .listar("token", centro_id, Some(EstadoSolicitud::Aprobada))
        .await
        .expect("la lista debía cargarse");

    assert_eq!(listado.solicitudes.len(), 1);
    assert!(listado
        .solicitudes
        .iter()
        .all(|s| s.estado == EstadoSolicitud::Aprobada));
    // Tallies cover the full set, not the filtered view.
    assert_eq!(listado.resumen.total, 3);
    assert_eq!(listado.resumen.pendientes, 2);
}

#[tokio::test]
async fn no_lista_solicitudes_de_otros_centros() {
    let centro = centro_de_prueba();
    let centro_id = centro.centro_formador_id;
    let stub = Arc::new(StubSupabaseClient::new(centro.clone()).con_solicitudes(vec![
        solicitud(centro_id, EstadoSolicitud::Pendiente, 10),
        solicitud(Uuid::new_v4(), EstadoSolicitud::Pendiente, 20),
    ]));
    let service = SolicitudesService::new(stub.clone());

    let listado = service
        .listar("token", centro_id, None)
        .await
        .expect("la lista debía cargarse");
    assert_eq!(listado.solicitudes.len(), 1);
}

#[tokio::test]
async fn ver_el_detalle_no_modifica_la_solicitud() {
    let centro = centro_de_prueba();
    let centro_id = centro.centro_formador_id;
    let rechazada = SolicitudCupos {
        motivo_rechazo: Some("Sin disponibilidad en el período".to_string()),
        ..solicitud(centro_id, EstadoSolicitud::Rechazada, 10)
    };
    let stub = Arc::new(
        StubSupabaseClient::new(centro.clone()).con_solicitudes(vec![rechazada.clone()]),
    );
    let service = SolicitudesService::new(stub.clone());

    // Open and close the detail twice, as the modal allows.
    let primera = service
        .detalle("token", centro_id, rechazada.id)
        .await
        .expect("el detalle debía cargarse");
    let segunda = service
        .detalle("token", centro_id, rechazada.id)
        .await
        .expect("el detalle debía cargarse");

    assert_eq!(primera.id, segunda.id);
    assert_eq!(primera.estado, segunda.estado);
    assert_eq!(
        segunda.motivo_rechazo.as_deref(),
        Some("Sin disponibilidad en el período")
    );
    assert_eq!(stub.escrituras(), 0, "el detalle es solo lectura");
}

#[tokio::test]
async fn el_detalle_de_otro_centro_no_se_expone() {
    let centro = centro_de_prueba();
    let ajena = solicitud(Uuid::new_v4(), EstadoSolicitud::Pendiente, 10);
    let stub = Arc::new(
        StubSupabaseClient::new(centro.clone()).con_solicitudes(vec![ajena.clone()]),
    );
    let service = SolicitudesService::new(stub.clone());

    let error = service
        .detalle("token", centro.centro_formador_id, ajena.id)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::NotFound));
}
