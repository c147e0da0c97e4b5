use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use newsletter_core::storage::{store_error_to_status_code, StoreError};

/// Wrapper around `anyhow::Error` so handlers can bubble failures up with `?`.
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Storage failures carry their own status mapping; anything else is a 500.
        let status = match self.0.downcast_ref::<StoreError>() {
            Some(store_err) => StatusCode::from_u16(store_error_to_status_code(store_err))
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.0.to_string()).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
