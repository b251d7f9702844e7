use serde::{Deserialize, Serialize};

/// Education level the portal user is requesting slots for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NivelFormacion {
    Pregrado,
    Postgrado,
}

pub const ESPECIALIDADES_PREGRADO: &[&str] = &[
    "Enfermería",
    "Técnico de Nivel Superior en Enfermería",
    "Medicina",
    "Kinesiología",
    "Nutrición",
    "Obstetricia",
    "Odontología",
    "Tecnología Médica",
    "Técnico en Laboratorio Clínico",
    "Técnico en Radiología",
    "Terapia Ocupacional",
    "Fonoaudiología",
    "Química y Farmacia",
    "Podología",
    "Técnico en Enfermería",
    "Técnico Paramédico",
];

pub const ESPECIALIDADES_POSTGRADO: &[&str] = &[
    "Medicina - Especialización",
    "Odontología - Especialización",
    "Enfermería en Cuidados Críticos",
    "Medicina Familiar",
    "Pediatría",
    "Cirugía",
    "Medicina Interna",
    "Ginecología y Obstetricia",
];

pub fn especialidades(nivel: NivelFormacion) -> &'static [&'static str] {
    match nivel {
        NivelFormacion::Pregrado => ESPECIALIDADES_PREGRADO,
        NivelFormacion::Postgrado => ESPECIALIDADES_POSTGRADO,
    }
}
