use std::sync::Arc;
use actix_web::dev;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse};
use futures_core::future::LocalBoxFuture;
use crate::proxy_service::ProxyPipeline;

pub struct ProxyRouteService {
  pub(super) pipeline: Arc<ProxyPipeline>,
}

impl Service<ServiceRequest> for ProxyRouteService {
  type Response = ServiceResponse;
  type Error = actix_web::Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  dev::always_ready!();

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let (http_request, payload) = req.into_parts();
    let pipeline = self.pipeline.clone();

    Box::pin(async move {
      let response = pipeline.handle(&http_request, payload).await;
      Ok(ServiceResponse::new(http_request, response))
    })
  }
}
