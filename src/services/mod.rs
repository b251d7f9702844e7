pub mod cupos;
pub mod rotacion;
pub mod solicitudes;
pub mod watcher;

pub use cupos::CuposService;
pub use rotacion::{EnvioRotacion, EtapaEnvio, RotacionService};
pub use solicitudes::{ListadoSolicitudes, SolicitudesService};
pub use watcher::{CambioSolicitudes, SolicitudesWatcher};
