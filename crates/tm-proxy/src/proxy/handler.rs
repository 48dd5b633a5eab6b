//! Request handling: fetch the target, then rewrite what comes back.
//!
//! Per request the flow is:
//! - reject anything but `GET`
//! - resolve the target and upstream URI from the inbound request
//! - fetch through the [`UpstreamFetch`] collaborator
//! - turn the upstream response into a redirect, a rewritten document or a pass-through body

use super::client::{UpstreamFetch, UpstreamResponse};
use super::response::{content_response, error_response, method_not_allowed, redirect_response};
use super::target::{InboundSettings, ProxyRequest};
use crate::error::ProxyError;
use crate::rewrite::{html, redirect, RewriteContext};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, LOCATION};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use tracing::{debug, error, info, warn};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Borrowed server state handed to each request.
pub struct RequestHandlerContext<'a> {
    pub fetcher: &'a dyn UpstreamFetch,
    pub inbound: &'a InboundSettings,
}

/// Handle one inbound request. Failures are turned into responses, never propagated.
pub async fn handle_request<B>(
    ctx: &RequestHandlerContext<'_>,
    req: Request<B>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let start_time = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Received request: {} {}", method, req.uri());

    if method != Method::GET {
        info!("Rejecting {} {}: only GET is proxied", method, path);
        return Ok(method_not_allowed());
    }

    let request = ProxyRequest::from_request(&req, ctx.inbound);
    let response = match proxy(ctx.fetcher, &request).await {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to proxy {} to {}: {}", path, request.target, e);
            error_response(&e)
        }
    };

    let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
    info!(
        "{} {} target={} status={} duration={:.2}ms",
        method,
        path,
        request.target,
        response.status().as_u16(),
        duration_ms
    );

    Ok(response)
}

async fn proxy(
    fetcher: &dyn UpstreamFetch,
    request: &ProxyRequest,
) -> Result<Response<Full<Bytes>>, ProxyError> {
    let uri = request.upstream_uri()?;
    let upstream = fetcher.fetch(uri).await?;
    Ok(process_response(upstream, &request.rewrite_context()))
}

/// Map an upstream response to the response sent to the client.
///
/// - 3xx keeps its status; `Location` survives only if it points into the target
/// - `text/html` bodies are rewritten and returned with the upstream content type
/// - anything else passes through unchanged
///
/// Non-redirect responses are always sent as 200, whatever upstream answered.
pub fn process_response(upstream: UpstreamResponse, ctx: &RewriteContext) -> Response<Full<Bytes>> {
    if upstream.status.is_redirection() {
        let location = upstream
            .header(&LOCATION)
            .and_then(|location| redirect::rewrite(location, ctx));
        if location.is_none() {
            if let Some(original) = upstream.header(&LOCATION) {
                warn!(
                    "Dropping redirect to {} (outside target {})",
                    original,
                    ctx.target_domain()
                );
            }
        }
        return redirect_response(upstream.status, location.as_deref());
    }

    let UpstreamResponse { headers, body, .. } = upstream;
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    if is_html(content_type) {
        let document = html::apply(&body, ctx);
        content_response(content_type, document)
    } else {
        content_response(content_type, body)
    }
}

fn is_html(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/html")
}
