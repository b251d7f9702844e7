use serde::Serialize;

/// Roster file as received from the upload form, before any validation.
#[derive(Debug, Clone)]
pub struct ArchivoPlanilla {
    pub nombre: String,
    pub content_type: Option<String>,
    pub datos: Vec<u8>,
}

/// Durable reference to an uploaded roster file.
#[derive(Debug, Clone, Serialize)]
pub struct ArchivoSubido {
    pub url: String,
    pub nombre: String,
}
