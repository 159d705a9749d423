//! Single-upstream reverse proxy.
//!
//! Every request is pointed at one fixed backend under the `/prometheus`
//! path prefix; `multipart/form-data` submissions are re-encoded as
//! `application/x-www-form-urlencoded` on the way. Responses are relayed
//! untouched.

pub mod app_config;
pub mod diagnostics;
pub mod form_field_set;
pub mod forwarder;
pub mod hop_headers;
pub mod http_client;
pub mod payload_stream;
pub mod proxy_request;
pub mod proxy_service;
pub mod request_transformer;
pub mod std_logger;
pub mod upstream_target;

pub use app_config::{AppConfig, CliArgs, ConfigError};
pub use proxy_service::proxy_factory::ProxyRouteServiceFactory;
pub use proxy_service::ProxyPipeline;
pub use upstream_target::UpstreamTarget;
