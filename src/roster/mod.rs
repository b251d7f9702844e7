pub mod parser;
pub mod template;

pub use parser::{PlanillaParseada, parse_estudiantes};
pub use template::{NOMBRE_PLANTILLA, generar_plantilla};

/// Upload constraints, enforced by the caller before parsing.
pub const MAX_TAMANO_ARCHIVO: usize = 5 * 1024 * 1024;

pub const TIPOS_PERMITIDOS: &[&str] = &[
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];
