use rocket::{
    FromForm, State, delete,
    form::{self, error::ErrorKind},
    fs::TempFile,
    get,
    http::Status,
    patch, post, put,
};
use std::io;
use tracing::{error, warn};

use crate::{
    api_service::FileIngestor,
    chunk_registry::ChunkDescriptor,
    ingest::{IngestError, parse_index},
};

const ONLY_POST: &str = "Only POST method is allowed";

#[derive(FromForm)]
pub struct ChunkUpload<'r> {
    // declared file name of this part is the file identifier
    pub file: form::Result<'r, TempFile<'r>>,
    pub index: form::Result<'r, String>,
}

enum UploadError {
    Ingest(IngestError),
    // field rocket refused to parse (over its limit, wrong shape, ...)
    Form(Status),
}

impl From<IngestError> for UploadError {
    fn from(e: IngestError) -> Self {
        UploadError::Ingest(e)
    }
}

#[post("/upload_chunk", data = "<upload>")]
pub async fn upload_chunk(
    upload: form::Form<ChunkUpload<'_>>,
    ingestor: &State<FileIngestor>,
) -> (Status, String) {
    match accept_chunk(upload.into_inner(), ingestor).await {
        Ok(descriptor) => (
            Status::Ok,
            format!("Chunk {} uploaded successfully", descriptor.index),
        ),
        Err(UploadError::Ingest(e)) if e.is_client_error() => {
            warn!(error=%e,"Rejected chunk upload");
            (Status::BadRequest, e.to_string())
        }
        Err(UploadError::Ingest(e)) => {
            error!(error=%e,"Error while accepting chunk upload");
            (Status::InternalServerError, e.to_string())
        }
        Err(UploadError::Form(status)) => {
            let reason = status.reason().unwrap_or("request failed");
            (status, reason.to_string())
        }
    }
}

/// Missing fields become the matching client error and a failed spool of the
/// part to rocket's temp dir is a storage failure. Anything else keeps rocket's status.
fn form_field<'r, T>(field: form::Result<'r, T>, missing: IngestError) -> Result<T, UploadError> {
    let errors = match field {
        Ok(v) => return Ok(v),
        Err(errors) => errors,
    };
    warn!(%errors, "Upload form field rejected");
    if let Some(e) = errors.iter().find_map(|e| match &e.kind {
        ErrorKind::Io(e) => Some(e),
        _ => None,
    }) {
        let spool_error = io::Error::new(e.kind(), e.to_string());
        return Err(IngestError::Storage(spool_error.into()).into());
    }
    if errors.iter().any(|e| matches!(e.kind, ErrorKind::Missing)) {
        return Err(missing.into());
    }
    Err(UploadError::Form(errors.status()))
}

async fn accept_chunk(
    upload: ChunkUpload<'_>,
    ingestor: &FileIngestor,
) -> Result<ChunkDescriptor, UploadError> {
    let file = form_field(upload.file, IngestError::MissingPayload)?;
    let file_id = file
        .raw_name()
        .map(|name| name.dangerous_unsafe_unsanitized_raw().as_str())
        .ok_or(IngestError::MissingFileName)?;
    let raw_index = form_field(upload.index, IngestError::MissingIndex)?;
    let index = parse_index(Some(raw_index.as_str()))?;
    let reader = file
        .open()
        .await
        .map_err(|e| IngestError::Storage(e.into()))?;
    tokio::pin!(reader);
    Ok(ingestor.ingest(file_id, index, &mut reader).await?)
}

#[get("/upload_chunk")]
pub fn reject_get() -> (Status, &'static str) {
    (Status::MethodNotAllowed, ONLY_POST)
}

#[put("/upload_chunk")]
pub fn reject_put() -> (Status, &'static str) {
    (Status::MethodNotAllowed, ONLY_POST)
}

#[patch("/upload_chunk")]
pub fn reject_patch() -> (Status, &'static str) {
    (Status::MethodNotAllowed, ONLY_POST)
}

#[delete("/upload_chunk")]
pub fn reject_delete() -> (Status, &'static str) {
    (Status::MethodNotAllowed, ONLY_POST)
}
