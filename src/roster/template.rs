//! Downloadable roster template: an empty workbook carrying exactly the
//! header row the parser expects.

use rust_xlsxwriter::{Workbook, XlsxError};
use tracing::error;

use crate::error::AppError;

pub const NOMBRE_PLANTILLA: &str = "plantilla_estudiantes.xlsx";

pub const ENCABEZADOS: [&str; 4] = ["rut", "nombre", "apellido", "email"];

pub fn generar_plantilla() -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let hoja = workbook.add_worksheet();
    hoja.set_name("Estudiantes").map_err(error_plantilla)?;

    for (columna, titulo) in ENCABEZADOS.iter().enumerate() {
        hoja.write_string(0, columna as u16, *titulo)
            .map_err(error_plantilla)?;
        hoja.set_column_width(columna as u16, 24)
            .map_err(error_plantilla)?;
    }

    workbook.save_to_buffer().map_err(error_plantilla)
}

fn error_plantilla(err: XlsxError) -> AppError {
    error!("no se pudo generar la plantilla: {}", err);
    AppError::Internal
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, open_workbook_auto_from_rs};
    use std::io::Cursor;

    #[test]
    fn la_plantilla_lleva_los_encabezados_esperados() {
        let datos = generar_plantilla().unwrap();

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(datos)).unwrap();
        let hoja = workbook.sheet_names().first().cloned().unwrap();
        assert_eq!(hoja, "Estudiantes");

        let rango = workbook.worksheet_range(&hoja).unwrap();
        let primera_fila: Vec<String> = rango
            .rows()
            .next()
            .unwrap()
            .iter()
            .map(|celda| match celda {
                Data::String(s) => s.clone(),
                otro => otro.to_string(),
            })
            .collect();
        assert_eq!(primera_fila, ENCABEZADOS);
    }

    #[test]
    fn la_plantilla_vacia_no_pasa_como_planilla_con_estudiantes() {
        let datos = generar_plantilla().unwrap();
        let error = crate::roster::parse_estudiantes(&datos).unwrap_err();
        assert!(matches!(error, crate::error::AppError::Parse(_)));
    }
}
