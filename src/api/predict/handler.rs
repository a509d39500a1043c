// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict endpoint handler

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use tracing::{debug, info, warn};

use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::reading::ReadingSet;
use crate::vision::{decode_image_bytes, ImageError};

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

pub const NO_IMAGE_UPLOADED: &str = "No image uploaded";
pub const NO_SELECTED_FILE: &str = "No selected file";

/// File taken from the multipart body
#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// POST /predict - Read the counters in an uploaded meter photo
///
/// # Request
/// - multipart form, field `image`: the photo
///
/// # Response
/// - `{"Reading_<i>": {"top_left_reading": ..., "main_reading": ...}}` with
///   one entry per region that produced glyphs, `i` in detection order
///
/// # Errors
/// - 400 Bad Request: no `image` field, empty file name, undecodable image
/// - 413 Payload Too Large: body above the upload limit
/// - 500 Internal Server Error: no counter detected, storage failure
/// - 502 Bad Gateway / 504 Gateway Timeout: detection backend failure
pub async fn predict_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ReadingSet>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Predict request is not multipart: {}", e);
        ApiError::InvalidRequest(NO_IMAGE_UPLOADED.to_string())
    })?;

    // 1. Extract the upload
    let upload = read_image_field(&mut multipart).await?;
    debug!(
        "Upload received: {} ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    );

    // 2. Validate and decode
    let (image, info) = decode_image_bytes(&upload.bytes, state.max_upload_bytes).map_err(|e| {
        warn!("Failed to decode upload {}: {}", upload.file_name, e);
        match e {
            ImageError::TooLarge(..) => ApiError::PayloadTooLarge(e.to_string()),
            _ => ApiError::InvalidRequest(format!("Invalid image: {}", e)),
        }
    })?;

    // 3. Persist for the detection backend
    let image_path = state
        .pipeline
        .store()
        .save_upload(&upload.file_name, &upload.bytes, Some(info.format))
        .await
        .map_err(|e| {
            warn!("Failed to save upload: {}", e);
            ApiError::InternalError(e.to_string())
        })?;

    // 4. Run the pipeline
    let readings = state
        .pipeline
        .read_meter(&image_path, &image)
        .await
        .map_err(|e| {
            warn!("Reading failed for {}: {}", image_path.display(), e);
            ApiError::from(e)
        })?;

    info!(
        "Predict complete: {}x{} image, {} readings",
        info.width,
        info.height,
        readings.len()
    );

    Ok(Json(readings))
}

/// Pull the `image` file out of a multipart body
async fn read_image_field(multipart: &mut Multipart) -> Result<ImageUpload, ApiError> {
    loop {
        let field = multipart.next_field().await.map_err(|e| {
            warn!("Malformed multipart body: {}", e);
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge(e.body_text())
            } else {
                ApiError::InvalidRequest(format!("Invalid multipart body: {}", e.body_text()))
            }
        })?;

        let Some(field) = field else {
            return Err(ApiError::InvalidRequest(NO_IMAGE_UPLOADED.to_string()));
        };

        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = match field.file_name() {
            None => return Err(ApiError::InvalidRequest(NO_IMAGE_UPLOADED.to_string())),
            Some("") => return Err(ApiError::InvalidRequest(NO_SELECTED_FILE.to_string())),
            Some(name) => name.to_string(),
        };

        let bytes = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge(e.body_text())
            } else {
                ApiError::InvalidRequest(format!("Invalid multipart body: {}", e.body_text()))
            }
        })?;

        return Ok(ImageUpload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
}
