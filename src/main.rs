use std::io::{ErrorKind, Result};
use std::sync::Arc;

use actix_web::{App, HttpServer};
use clap::Parser;
use log::info;

use prefix_proxy::diagnostics::observer_for;
use prefix_proxy::http_client::HttpClientConfig;
use prefix_proxy::{std_logger, AppConfig, CliArgs, ProxyPipeline, ProxyRouteServiceFactory};

#[actix_web::main]
async fn main() -> Result<()> {
  let args = CliArgs::parse();
  let config = AppConfig::resolve(args).map_err(|err| std::io::Error::new(ErrorKind::Other, err))?;

  std_logger::init(std_logger::level_for(config.debug))
    .map_err(|err| std::io::Error::new(ErrorKind::Other, err.to_string()))?;

  let http_client = HttpClientConfig {
    timeout: config.upstream_timeout,
  }
  .to_client()
  .map_err(|err| std::io::Error::new(ErrorKind::Other, err))?;

  let pipeline = Arc::new(ProxyPipeline::new(
    config.target.clone(),
    http_client,
    observer_for(config.debug),
  ));

  info!(
    "Starting reverse proxy on {}:{} to {} (Debug: {})",
    config.bind, config.port, config.target, config.debug
  );

  HttpServer::new(move || App::new().default_service(ProxyRouteServiceFactory::create(pipeline.clone())))
    .workers(config.worker_count)
    .bind((config.bind.as_str(), config.port))?
    .run()
    .await
}
