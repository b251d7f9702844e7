//! Change watcher behind the request list.
//!
//! The platform notifies row updates over its realtime channel; here the
//! subscription is rendered as a per-connection poll over the same table
//! API. Each tick snapshots `(id, estado)` for the center's requests and
//! emits an invalidation signal when the snapshot changed, so the list can
//! re-fetch. The watcher lives exactly as long as its stream: dropping the
//! stream (the connection closing) tears it down.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::models::EstadoSolicitud;
use crate::supabase::SupabaseClient;

#[derive(Debug, Clone, Serialize)]
pub struct CambioSolicitudes {
    /// How many requests changed state since the previous snapshot.
    pub cambios: usize,
}

type Huella = HashMap<Uuid, EstadoSolicitud>;

pub struct SolicitudesWatcher {
    supabase: Arc<dyn SupabaseClient>,
    access_token: String,
    centro_id: Uuid,
    intervalo: Duration,
}

impl SolicitudesWatcher {
    pub fn new(
        supabase: Arc<dyn SupabaseClient>,
        access_token: String,
        centro_id: Uuid,
        intervalo: Duration,
    ) -> Self {
        Self {
            supabase,
            access_token,
            centro_id,
            intervalo,
        }
    }

    /// Invalidation events until the consumer drops the stream. The first
    /// poll only takes the baseline; errors are logged and polling goes on.
    pub fn eventos(self) -> impl Stream<Item = CambioSolicitudes> {
        futures::stream::unfold(
            (self, None::<Huella>),
            |(watcher, mut anterior)| async move {
                loop {
                    tokio::time::sleep(watcher.intervalo).await;

                    let solicitudes = match watcher
                        .supabase
                        .fetch_solicitudes_cupos(&watcher.access_token, watcher.centro_id)
                        .await
                    {
                        Ok(solicitudes) => solicitudes,
                        Err(err) => {
                            warn!("watcher: no se pudo consultar solicitudes: {}", err);
                            continue;
                        }
                    };

                    let huella: Huella =
                        solicitudes.iter().map(|s| (s.id, s.estado)).collect();

                    match anterior.take() {
                        None => {
                            anterior = Some(huella);
                        }
                        Some(previa) => {
                            let cambios = huella
                                .iter()
                                .filter(|(id, estado)| previa.get(*id) != Some(*estado))
                                .count()
                                + previa.keys().filter(|id| !huella.contains_key(*id)).count();

                            if cambios == 0 {
                                anterior = Some(huella);
                                continue;
                            }
                            return Some((
                                CambioSolicitudes { cambios },
                                (watcher, Some(huella)),
                            ));
                        }
                    }
                }
            },
        )
    }
}
