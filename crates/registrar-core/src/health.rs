use axum::http::StatusCode;

/// Handler for `GET /healthz`: liveness check.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Map a dependency probe result to the readiness status code.
///
/// Failures are logged at `warn` with the probe name; the body stays empty.
pub fn readiness<E: std::fmt::Display>(probe: &str, result: Result<(), E>) -> StatusCode {
    match result {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            ::tracing::warn!(probe, error = %e, "readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
