// Library exports for the binary and integration tests

pub mod config;
pub mod error;
pub mod proxy;
pub mod rewrite;

pub use config::Config;
pub use error::ProxyError;
pub use proxy::ProxyServer;
