//! Per-request id generation and propagation.
//!
//! A UUID is minted at the edge, scoped into the task so envelope builders
//! can read it anywhere below, and echoed back in the `X-Request-ID`
//! response header.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Returns the id of the request currently being served.
pub fn current_request_id() -> String {
    REQUEST_ID
        .try_with(Clone::clone)
        .unwrap_or_else(|_| "unknown".to_owned())
}

pub async fn propagate_request_id(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    let mut response = REQUEST_ID
        .scope(request_id.clone(), next.run(request))
        .await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::{Json, Router};
    use tower::ServiceExt;

    use crate::dto::ApiResponse;

    use super::{REQUEST_ID_HEADER, propagate_request_id};

    async fn ping() -> Json<ApiResponse<()>> {
        Json(ApiResponse::message("pong"))
    }

    #[tokio::test]
    async fn response_header_echoes_the_envelope_request_id() {
        let app = Router::new()
            .route("/ping", get(ping))
            .layer(from_fn(propagate_request_id));

        let request = Request::builder()
            .uri("/ping")
            .body(Body::empty())
            .unwrap_or_else(|_| panic!("request"));
        let response = app
            .oneshot(request)
            .await
            .unwrap_or_else(|_| panic!("response"));

        let header = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| panic!("missing request id header"));
        assert!(uuid::Uuid::parse_str(&header).is_ok());

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|_| panic!("body"));
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).unwrap_or_else(|_| panic!("json body"));

        assert_eq!(value["requestId"], header.as_str());
    }
}
