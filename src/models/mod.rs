pub mod archivo;
pub mod centro;
pub mod especialidad;
pub mod estudiante;
pub mod solicitud;

pub use archivo::{ArchivoPlanilla, ArchivoSubido};
pub use centro::{CentroFormador, Usuario, UsuarioCentro};
pub use especialidad::{NivelFormacion, especialidades};
pub use estudiante::{EstudianteFila, NuevoEstudianteRotacion};
pub use solicitud::{
    EstadoSolicitud, FormSolicitudCupos, FormSolicitudRotacion, NuevaSolicitudCupos,
    NuevaSolicitudRotacion, ResumenSolicitudes, SolicitudCupos, SolicitudRotacion,
};
