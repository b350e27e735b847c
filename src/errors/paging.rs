use actix_web::{HttpResponse, ResponseError, body::BoxBody, http::StatusCode};

use crate::models::responses::{ApiError, ApiResponse, Empty, ErrorDetail};

/// Rejected paging parameters. Nothing is clamped silently: a page index or size
/// below 1 is always an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PagingError {
    #[error("Page index must be at least 1, got {0}")]
    InvalidPageIndex(i64),

    #[error("Page size must be at least 1, got {0}")]
    InvalidPageSize(i64),

    #[error("Page {page_index} with page size {page_size} is out of range")]
    OffsetOverflow { page_index: i64, page_size: i64 },
}

impl PagingError {
    /// Name of the request parameter at fault
    pub fn parameter(&self) -> &'static str {
        match self {
            PagingError::InvalidPageIndex(_) => "page",
            PagingError::InvalidPageSize(_) => "page_size",
            PagingError::OffsetOverflow { .. } => "page",
        }
    }
}

impl ResponseError for PagingError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let message = self.to_string();
        let details = [ErrorDetail {
            field: self.parameter(),
            message: &message,
        }];

        let error = ApiError {
            code: "invalid_parameter",
            message: &message,
            details: &details,
        };

        let response: ApiResponse<'_, Empty> = ApiResponse {
            error: Some(error),
            ..Default::default()
        };

        HttpResponse::build(self.status_code()).json(response)
    }
}
