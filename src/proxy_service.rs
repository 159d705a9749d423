use actix_web::dev::Payload;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use reqwest::Client;

use crate::diagnostics::{RequestId, RequestObserver};
use crate::forwarder::Forwarder;
use crate::proxy_request::ProxyRequest;
use crate::request_transformer;
use crate::upstream_target::UpstreamTarget;

pub mod proxy_factory;
pub mod proxy_route_service;

/// Everything a request needs on its way through the proxy.
///
/// Built once at startup and shared by every worker; nothing in here changes
/// after construction.
pub struct ProxyPipeline {
  target: UpstreamTarget,
  forwarder: Forwarder,
  observer: Box<dyn RequestObserver>,
}

impl ProxyPipeline {
  pub fn new(target: UpstreamTarget, http_client: Client, observer: Box<dyn RequestObserver>) -> Self {
    Self {
      target,
      forwarder: Forwarder::new(http_client),
      observer,
    }
  }

  pub fn target(&self) -> &UpstreamTarget {
    &self.target
  }

  pub async fn handle(&self, http_request: &HttpRequest, payload: Payload) -> HttpResponse {
    let id = RequestId::new();
    self.observer.received(id, http_request.method(), http_request.path());

    let mut request = ProxyRequest::from_parts(http_request, payload);

    match request_transformer::transform(&mut request, &self.target).await {
      Ok(Some(fields)) => self.observer.form_converted(id, &fields),
      Ok(None) => {}
      Err(err) => {
        self.observer.form_rejected(id, &err);
        return err.error_response();
      }
    }

    self.observer.forwarding(id, &request.url());

    let response = match self.forwarder.forward(request).await {
      Ok(response) => response,
      Err(err) => {
        self.observer.upstream_failed(id, &err);
        err.error_response()
      }
    };

    self.observer.completed(id, &response);
    response
  }
}
