//! `POST /api/fileuploader`: replaces an artifact on the data path.
//!
//! Unauthenticated as shipped. Put it behind authorization before exposing
//! the server beyond a trusted network.

use super::AppState;
use crate::domain::errors::UploadError;
use axum::Json;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use std::path::PathBuf;
use tracing::warn;

const FILE_FIELD: &str = "file";

/// Answers `true` when the file was stored, `false` otherwise.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<bool> {
    let stored = match multipart {
        Ok(multipart) => receive(&state, multipart).await,
        Err(rejection) => Err(UploadError::Malformed {
            reason: rejection.body_text(),
        }),
    };

    match stored {
        Ok(_) => {
            state.metrics.inc_uploads("success");
            Json(true)
        }
        Err(e) => {
            warn!("Upload rejected: {}", e);
            state.metrics.inc_uploads("failure");
            Json(false)
        }
    }
}

async fn receive(state: &AppState, mut multipart: Multipart) -> Result<PathBuf, UploadError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed {
            reason: e.body_text(),
        })?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| UploadError::Malformed {
            reason: e.body_text(),
        })?;

        let store = state.store.clone();
        return tokio::task::spawn_blocking(move || store.save_upload(&file_name, &bytes))
            .await
            .map_err(|e| UploadError::Malformed {
                reason: format!("Background task failed: {}", e),
            })?;
    }
    Err(UploadError::MissingFile)
}
