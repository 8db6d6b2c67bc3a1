use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use uuid::Uuid;

/// Tags every request with an id and logs method, path, status and
/// latency. Callback payload logging happens in the validator, not here.
pub async fn request_logger(mut req: Request<Body>, next: Next<Body>) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    if let Ok(value) = request_id.parse() {
        req.headers_mut().insert("x-request-id", value);
    }

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "request received"
    );

    let response = next.run(req).await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        latency_ms = %start.elapsed().as_millis(),
        "request completed"
    );

    response
}
