use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures::StreamExt;
use uuid::Uuid;

use portal_centros::models::{
    CentroFormador, EstadoSolicitud, NuevaSolicitudCupos, SolicitudCupos, UsuarioCentro,
};
use portal_centros::services::SolicitudesWatcher;
use portal_centros::supabase::{StubSupabaseClient, SupabaseClient};

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

fn solicitud_pendiente(centro_id: Uuid) -> SolicitudCupos {
    SolicitudCupos {
        id: Uuid::new_v4(),
        centro_formador_id: centro_id,
        especialidad: "Medicina".to_string(),
        numero_cupos: 4,
        fecha_inicio: fecha("2026-09-01"),
        fecha_termino: fecha("2026-12-15"),
        solicitante: None,
        comentarios: None,
        estado: EstadoSolicitud::Pendiente,
        motivo_rechazo: None,
        fecha_solicitud: fecha("2026-08-01"),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn emite_un_evento_cuando_cambia_un_estado() {
    let centro = centro_de_prueba();
    let pendiente = solicitud_pendiente(centro.centro_formador_id);
    let stub = Arc::new(
        StubSupabaseClient::new(centro.clone()).con_solicitudes(vec![pendiente.clone()]),
    );

    let watcher = SolicitudesWatcher::new(
        stub.clone(),
        "token".to_string(),
        centro.centro_formador_id,
        Duration::from_millis(20),
    );
    let mut eventos = Box::pin(watcher.eventos());

    // The hospital resolves the request while the watcher is running.
    let stub_hospital = stub.clone();
    let solicitud_id = pendiente.id;
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        stub_hospital.actualizar_estado(solicitud_id, EstadoSolicitud::Aprobada, None);
    });

    let evento = tokio::time::timeout(Duration::from_secs(2), eventos.next())
        .await
        .expect("el evento debía llegar dentro de un ciclo de sondeo")
        .expect("el stream no debía cerrarse");
    assert_eq!(evento.cambios, 1);
}

#[tokio::test]
async fn no_emite_nada_si_no_hay_cambios() {
    let centro = centro_de_prueba();
    let stub = Arc::new(
        StubSupabaseClient::new(centro.clone())
            .con_solicitudes(vec![solicitud_pendiente(centro.centro_formador_id)]),
    );

    let watcher = SolicitudesWatcher::new(
        stub,
        "token".to_string(),
        centro.centro_formador_id,
        Duration::from_millis(20),
    );
    let mut eventos = Box::pin(watcher.eventos());

    let resultado = tokio::time::timeout(Duration::from_millis(200), eventos.next()).await;
    assert!(resultado.is_err(), "sin cambios no debía llegar ningún evento");
}

#[tokio::test]
async fn una_solicitud_nueva_tambien_invalida_la_lista() {
    let centro = centro_de_prueba();
    let stub = Arc::new(
        StubSupabaseClient::new(centro.clone())
            .con_solicitudes(vec![solicitud_pendiente(centro.centro_formador_id)]),
    );

    let watcher = SolicitudesWatcher::new(
        stub.clone(),
        "token".to_string(),
        centro.centro_formador_id,
        Duration::from_millis(20),
    );
    let mut eventos = Box::pin(watcher.eventos());

    let stub_insercion = stub.clone();
    let nueva = NuevaSolicitudCupos {
        centro_formador_id: centro.centro_formador_id,
        especialidad: "Nutrición".to_string(),
        numero_cupos: 1,
        fecha_inicio: fecha("2026-10-01"),
        fecha_termino: fecha("2026-11-30"),
        solicitante: None,
        comentarios: None,
        estado: EstadoSolicitud::Pendiente,
        fecha_solicitud: fecha("2026-08-07"),
    };
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        stub_insercion
            .insert_solicitud_cupos("token", &nueva)
            .await
            .expect("la inserción de prueba debía funcionar");
    });

    let evento = tokio::time::timeout(Duration::from_secs(2), eventos.next())
        .await
        .expect("el evento debía llegar dentro de un ciclo de sondeo")
        .expect("el stream no debía cerrarse");
    assert_eq!(evento.cambios, 1);
}
