//! HTTP proxy server.
//!
//! This module is organized into submodules:
//! - `server`: ProxyServer struct and main run loop
//! - `handler`: per-request orchestration
//! - `target`: inbound query parsing and upstream URI construction
//! - `client`: upstream fetching over a pooled HTTP client
//! - `response`: response builders

mod client;
mod handler;
mod response;
mod server;
mod target;

pub use client::{create_http_client, HttpClient, HyperFetcher, UpstreamFetch, UpstreamResponse};
pub use handler::{handle_request, process_response, RequestHandlerContext};
pub use server::ProxyServer;
pub use target::{InboundSettings, ProxyRequest};
