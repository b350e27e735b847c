pub mod config;
pub mod paging;

use actix_web::{HttpResponse, ResponseError, body::BoxBody, http::StatusCode};

use crate::models::responses::{ApiError, ApiResponse, Empty};

pub use config::ConfigError;
pub use paging::PagingError;

/// Everything that can go wrong while building a page.
///
/// `E` is the error type of the underlying [`QuerySource`](crate::database::QuerySource);
/// those failures are passed through untouched.
#[derive(Debug, thiserror::Error)]
pub enum PageError<E> {
    #[error(transparent)]
    Paging(#[from] PagingError),

    #[error(transparent)]
    Source(E),
}

impl<E> PageError<E> {
    pub fn is_paging(&self) -> bool {
        matches!(self, PageError::Paging(_))
    }

    pub fn source_error(&self) -> Option<&E> {
        match self {
            PageError::Source(e) => Some(e),
            PageError::Paging(_) => None,
        }
    }
}

impl<E> ResponseError for PageError<E>
where
    E: std::error::Error + 'static,
{
    fn status_code(&self) -> StatusCode {
        match self {
            PageError::Paging(e) => e.status_code(),
            PageError::Source(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        match self {
            PageError::Paging(e) => e.error_response(),
            PageError::Source(e) => {
                tracing::error!("Page query failed: {e}");

                let error = ApiError {
                    code: "database_error",
                    message: "Failed to query the data source",
                    details: &[],
                };

                let response: ApiResponse<'_, Empty> = ApiResponse {
                    error: Some(error),
                    ..Default::default()
                };

                HttpResponse::build(self.status_code()).json(response)
            }
        }
    }
}
