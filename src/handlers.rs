// src/handlers.rs
use crate::{AppState, errors::StitchScanError};
use actix_multipart::{Field, Multipart};
use actix_web::{Error, HttpResponse, web};
use bytes::{Bytes, BytesMut};
use futures_util::TryStreamExt;
use uuid::Uuid;

/// The "file selected" intent. Takes the first image field of the
/// multipart body and runs it through the analysis workflow; a read
/// failure mid-stream still lands the workflow in its Error state.
pub async fn upload_image(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let mut field = match payload.try_next().await? {
        Some(field) => field,
        None => {
            return Err(StitchScanError::Validation("No file provided".to_string()).into());
        }
    };

    let media_type = field
        .content_type()
        .map(|ct| ct.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    if !media_type.starts_with("image/") {
        return Err(
            StitchScanError::Validation(format!("Unsupported media type: {}", media_type)).into(),
        );
    }

    let state = match read_field(&mut field).await {
        Ok(image_data) => data.workflow.submit(image_data, media_type).await,
        Err(err) => data.workflow.fail(err).await,
    };

    Ok(HttpResponse::Ok().json(state))
}

async fn read_field(field: &mut Field) -> Result<Bytes, StitchScanError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| StitchScanError::Read(e.to_string()))?
    {
        buf.extend_from_slice(&chunk);
    }
    if buf.is_empty() {
        return Err(StitchScanError::Read("empty upload".to_string()));
    }
    Ok(buf.freeze())
}

/// Read-only observable for the presentation layer.
pub async fn current_state(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(data.workflow.state().await))
}

/// The "reset requested" intent.
pub async fn reset_workflow(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(data.workflow.reset().await))
}

/// Serves a held preview. 404s once the workflow has released it.
pub async fn fetch_preview(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let preview_id = path.into_inner();
    match data.codec.preview(&preview_id).await {
        Some(preview) => Ok(HttpResponse::Ok()
            .content_type(preview.media_type.as_str())
            .body(preview.data)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Preview not found"
        }))),
    }
}
