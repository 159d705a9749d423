//! Per-request lifecycle hooks.
//!
//! The pipeline calls a [`RequestObserver`] at fixed points of every request.
//! Which observer is installed is decided once at startup, so the transform
//! and forward steps behave the same whether diagnostics are on or off.

use std::fmt::{Display, Formatter};

use actix_web::HttpResponse;
use log::{debug, error, info, warn};
use reqwest::Method;
use uuid::Uuid;

use crate::form_field_set::FormFieldSet;
use crate::forwarder::ForwardError;
use crate::request_transformer::TransformError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
  pub fn new() -> Self {
    RequestId(Uuid::new_v4())
  }
}

impl Default for RequestId {
  fn default() -> Self {
    Self::new()
  }
}

impl Display for RequestId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait RequestObserver: Send + Sync {
  fn received(&self, _id: RequestId, _method: &Method, _path: &str) {}

  fn form_converted(&self, _id: RequestId, _fields: &FormFieldSet) {}

  fn form_rejected(&self, _id: RequestId, _error: &TransformError) {}

  fn forwarding(&self, _id: RequestId, _url: &str) {}

  fn upstream_failed(&self, _id: RequestId, _error: &ForwardError) {}

  fn completed(&self, _id: RequestId, _response: &HttpResponse) {}
}

/// Only reports upstream failures.
pub struct SilentObserver;

impl RequestObserver for SilentObserver {
  fn upstream_failed(&self, id: RequestId, error: &ForwardError) {
    error!("[{}] Upstream request failed: {}", id, error);
  }
}

/// Verbose request tracing, enabled by the debug flag.
pub struct DebugObserver;

impl RequestObserver for DebugObserver {
  fn received(&self, id: RequestId, method: &Method, path: &str) {
    info!("[{}] Processing request: {} {}", id, method, path);
  }

  fn form_converted(&self, id: RequestId, fields: &FormFieldSet) {
    match serde_json::to_string_pretty(fields) {
      Ok(json) => info!("[{}] Form data: {}", id, json),
      Err(err) => warn!("[{}] Unable to render form data {}", id, err),
    }
    info!("[{}] Converted multipart form to URL-encoded form", id);
  }

  fn form_rejected(&self, id: RequestId, error: &TransformError) {
    info!("[{}] Error parsing form data: {}", id, error);
  }

  fn forwarding(&self, id: RequestId, url: &str) {
    info!("[{}] Forwarding to {}", id, url);
  }

  fn upstream_failed(&self, id: RequestId, error: &ForwardError) {
    error!("[{}] Upstream request failed: {}", id, error);
  }

  fn completed(&self, id: RequestId, response: &HttpResponse) {
    debug!("[{}] Response headers {:?}", id, response.headers());
    info!("[{}] Request completed ({})", id, response.status());
  }
}

pub fn observer_for(debug: bool) -> Box<dyn RequestObserver> {
  if debug {
    Box::new(DebugObserver)
  } else {
    Box::new(SilentObserver)
  }
}
