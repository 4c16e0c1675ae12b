use std::time::Duration;

/// Errors produced by the Tower Flash middleware stack.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlashError {
    /// The sale has not opened yet.
    ///
    /// When the `axum` feature is enabled, this converts to `403 Forbidden`
    /// with a `Retry-After` header if the opening time is known.
    #[error("Sale has not started yet")]
    NotStarted {
        /// How long until the sale opens.
        opens_in: Option<Duration>,
    },

    /// Capacity is exhausted or the request was shed.
    ///
    /// When the `axum` feature is enabled, this converts to `503 Service Unavailable`.
    #[error("Sold out; request blocked")]
    SoldOut,

    /// The admitted request did not complete within the allowed time.
    ///
    /// When the `axum` feature is enabled, this converts to `408 Request Timeout`.
    #[error("Request timed out")]
    Timeout,

    /// An unexpected error occurred in the inner service.
    ///
    /// The string contains the `Display` representation of the inner error.
    /// When the `axum` feature is enabled, this converts to `500 Internal Server Error`.
    #[error("Internal service error: {0}")]
    Inner(String),
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for FlashError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, msg, headers) = match self {
            Self::NotStarted { opens_in } => {
                let header = opens_in.map(|opens_in| {
                    // Round up so clients never come back early
                    let secs = opens_in.as_secs() + u64::from(opens_in.subsec_nanos() > 0);
                    let val = axum::http::HeaderValue::from(secs.max(1));
                    (axum::http::header::RETRY_AFTER, val)
                });
                (StatusCode::FORBIDDEN, "not start yet.\n".to_string(), header)
            }
            Self::SoldOut => (
                StatusCode::SERVICE_UNAVAILABLE,
                "sold out.\n".to_string(),
                None,
            ),
            Self::Timeout => (StatusCode::REQUEST_TIMEOUT, self.to_string(), None),
            Self::Inner(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None),
        };

        let mut response = (status, msg).into_response();
        if let Some((name, value)) = headers {
            response.headers_mut().insert(name, value);
        }
        response
    }
}
