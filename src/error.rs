use crate::loader::LoadError;
use std::io;

/// Every failure a request can end in
///
/// Each variant maps to one HTTP status at the boundary, see
/// [`AppError::status_code`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No file part")]
    MissingFile,

    #[error("No selected file")]
    EmptyFilename,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upload exceeds the size limit")]
    TooLarge,

    #[error("upload not found: {0}")]
    UploadNotFound(String),

    #[error("File not found")]
    NotFound,

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("cannot read spreadsheet: {0}")]
    Spreadsheet(#[from] LoadError),

    #[error("failed to render plot: {0}")]
    Render(String),

    #[error("failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("background task failed: {0}")]
    Join(String),
}

impl AppError {
    /// HTTP status code this error is reported with
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::MissingFile | AppError::EmptyFilename | AppError::InvalidRequest(_) => 400,
            AppError::UploadNotFound(_) | AppError::NotFound => 404,
            AppError::TooLarge => 413,
            AppError::ColumnNotFound(_) | AppError::Spreadsheet(_) => 422,
            AppError::Render(_) | AppError::Archive(_) | AppError::Io(_) | AppError::Join(_) => 500,
        }
    }
}

#[cfg(feature = "web")]
mod web {
    use super::AppError;
    use axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    };

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status =
                StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            if status.is_server_error() {
                log::error!("request failed: {}", self);
            } else {
                log::warn!("request rejected ({}): {}", status.as_u16(), self);
            }

            // Fetch endpoints answer with plain text, like a static file server
            if matches!(self, AppError::NotFound) {
                return (status, self.to_string()).into_response();
            }

            (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
        }
    }
}
