//! Response builders for the handler.

use crate::error::ProxyError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE, LOCATION};
use hyper::{Response, StatusCode};
use tracing::warn;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

fn with_status(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}

/// Plain-text error response carrying the error message.
pub fn error_response(err: &ProxyError) -> Response<Full<Bytes>> {
    let mut response = with_status(err.status(), err.to_string());
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    response
}

pub fn method_not_allowed() -> Response<Full<Bytes>> {
    let mut response = with_status(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    let headers = response.headers_mut();
    headers.insert(ALLOW, HeaderValue::from_static("GET"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    response
}

/// Empty redirect response; `Location` is only set when it is a valid header value.
pub fn redirect_response(status: StatusCode, location: Option<&str>) -> Response<Full<Bytes>> {
    let mut response = with_status(status, Bytes::new());
    if let Some(location) = location {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                response.headers_mut().insert(LOCATION, value);
            }
            Err(e) => warn!("Dropping unrepresentable Location '{}': {}", location, e),
        }
    }
    response
}

/// 200 response with the given content type and body.
pub fn content_response(content_type: &str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = with_status(StatusCode::OK, body);
    let value = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    response.headers_mut().insert(CONTENT_TYPE, value);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_error_response() {
        let response = error_response(&ProxyError::Upstream("connection refused".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            body_string(response).await,
            "Error forwarding request: connection refused"
        );
    }

    #[test]
    fn test_method_not_allowed() {
        let response = method_not_allowed();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "GET");
    }

    #[test]
    fn test_redirect_with_location() {
        let response = redirect_response(
            StatusCode::FOUND,
            Some("http://localhost:8080/redirected?target=https://example.com"),
        );
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "http://localhost:8080/redirected?target=https://example.com"
        );
    }

    #[test]
    fn test_redirect_without_location() {
        let response = redirect_response(StatusCode::MOVED_PERMANENTLY, None);
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert!(response.headers().get(LOCATION).is_none());
    }

    #[test]
    fn test_redirect_invalid_location_dropped() {
        let response = redirect_response(StatusCode::FOUND, Some("http://a/\nb"));
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response.headers().get(LOCATION).is_none());
    }

    #[tokio::test]
    async fn test_content_response() {
        let response = content_response("image/png", Bytes::from_static(&[0x89, 0x50]));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "image/png");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], &[0x89, 0x50]);
    }
}
