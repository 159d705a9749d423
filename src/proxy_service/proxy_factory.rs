use std::sync::Arc;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use futures_core::future::LocalBoxFuture;
use crate::proxy_service::ProxyPipeline;
use crate::proxy_service::proxy_route_service::ProxyRouteService;

/// Hands every worker a service backed by the shared pipeline.
pub struct ProxyRouteServiceFactory {
  pub pipeline: Arc<ProxyPipeline>,
}

impl ServiceFactory<ServiceRequest> for ProxyRouteServiceFactory {
  type Response = ServiceResponse;
  type Error = actix_web::Error;
  type Config = ();
  type Service = ProxyRouteService;
  type InitError = ();
  type Future = LocalBoxFuture<'static, Result<Self::Service, Self::InitError>>;

  fn new_service(&self, _: Self::Config) -> Self::Future {
    let service = ProxyRouteService {
      pipeline: self.pipeline.clone(),
    };

    Box::pin(async move { Ok(service) })
  }
}

impl ProxyRouteServiceFactory {
  pub fn create(pipeline: Arc<ProxyPipeline>) -> Self {
    Self { pipeline }
  }
}
