//! Roster spreadsheet parser.
//!
//! Pure transform from the uploaded bytes to validated student rows. The
//! header row is discovered by looking for a `rut` column; `rut`, `nombre`
//! and `apellido` are required per row, `email` is optional. Any data row
//! with a blank required field rejects the whole file, so what gets
//! submitted is exactly what the spreadsheet says.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use serde::Serialize;

use crate::error::AppError;
use crate::models::EstudianteFila;

#[derive(Debug, Clone, Serialize)]
pub struct PlanillaParseada {
    pub total: usize,
    pub estudiantes: Vec<EstudianteFila>,
}

/// How many leading rows may precede the header (titles, logos, blanks).
const FILAS_BUSQUEDA_ENCABEZADO: usize = 10;

struct Columnas {
    rut: usize,
    nombre: usize,
    apellido: usize,
    email: Option<usize>,
}

pub fn parse_estudiantes(datos: &[u8]) -> Result<PlanillaParseada, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(datos))
        .map_err(|e| AppError::Parse(format!("No se pudo leer el archivo Excel: {e}")))?;

    let hoja = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::Parse("El archivo no contiene hojas".to_string()))?;

    let rango = workbook
        .worksheet_range(&hoja)
        .map_err(|e| AppError::Parse(format!("No se pudo leer la hoja '{hoja}': {e}")))?;

    let filas: Vec<Vec<Data>> = rango.rows().map(|r| r.to_vec()).collect();
    let (fila_encabezado, columnas) = buscar_encabezado(&filas)?;

    let mut estudiantes = Vec::new();
    for (indice, fila) in filas.iter().enumerate().skip(fila_encabezado + 1) {
        if fila_vacia(fila) {
            continue;
        }

        let rut = celda_texto(fila, columnas.rut);
        let nombre = celda_texto(fila, columnas.nombre);
        let apellido = celda_texto(fila, columnas.apellido);

        if rut.is_empty() || nombre.is_empty() || apellido.is_empty() {
            // 1-based, as the row is numbered in the spreadsheet itself.
            return Err(AppError::Parse(format!(
                "Fila {}: rut, nombre y apellido son obligatorios",
                indice + 1
            )));
        }

        let email = columnas
            .email
            .map(|col| celda_texto(fila, col))
            .filter(|email| !email.is_empty());

        estudiantes.push(EstudianteFila {
            rut,
            nombre,
            apellido,
            email,
        });
    }

    if estudiantes.is_empty() {
        return Err(AppError::Parse(
            "La planilla no contiene estudiantes".to_string(),
        ));
    }

    Ok(PlanillaParseada {
        total: estudiantes.len(),
        estudiantes,
    })
}

fn buscar_encabezado(filas: &[Vec<Data>]) -> Result<(usize, Columnas), AppError> {
    for (indice, fila) in filas.iter().take(FILAS_BUSQUEDA_ENCABEZADO).enumerate() {
        let encabezados: Vec<String> = fila
            .iter()
            .map(|celda| celda_a_texto(celda).to_lowercase())
            .collect();

        let posicion = |nombres: &[&str]| {
            encabezados
                .iter()
                .position(|encabezado| nombres.contains(&encabezado.as_str()))
        };

        let Some(rut) = posicion(&["rut"]) else {
            continue;
        };
        let nombre = posicion(&["nombre", "nombres"])
            .ok_or_else(|| columna_faltante("nombre"))?;
        let apellido = posicion(&["apellido", "apellidos"])
            .ok_or_else(|| columna_faltante("apellido"))?;
        let email = posicion(&["email", "correo", "e-mail"]);

        return Ok((
            indice,
            Columnas {
                rut,
                nombre,
                apellido,
                email,
            },
        ));
    }

    Err(AppError::Parse(
        "No se encontró la fila de encabezados (se esperaba una columna 'rut')".to_string(),
    ))
}

fn columna_faltante(columna: &str) -> AppError {
    AppError::Parse(format!(
        "La planilla no contiene la columna obligatoria '{columna}'"
    ))
}

fn celda_texto(fila: &[Data], columna: usize) -> String {
    fila.get(columna).map(celda_a_texto).unwrap_or_default()
}

fn celda_a_texto(celda: &Data) -> String {
    match celda {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Ruts and phone-like columns come back as floats; keep whole
            // numbers free of a decimal part.
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

fn fila_vacia(fila: &[Data]) -> bool {
    fila.iter().all(|celda| celda_a_texto(celda).is_empty())
}
