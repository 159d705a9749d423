#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use prefix_proxy::diagnostics::SilentObserver;
use prefix_proxy::http_client::HttpClientConfig;
use prefix_proxy::{ProxyPipeline, ProxyRouteServiceFactory, UpstreamTarget};

pub fn proxy_factory(target_url: &str, timeout: Duration) -> ProxyRouteServiceFactory {
  let target = UpstreamTarget::parse(target_url).expect("valid target");
  let http_client = HttpClientConfig { timeout: Some(timeout) }
    .to_client()
    .expect("http client");

  ProxyRouteServiceFactory::create(Arc::new(ProxyPipeline::new(target, http_client, Box::new(SilentObserver))))
}

/// A multipart body; parts with a file name are sent as file uploads.
pub fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &str)]) -> String {
  let mut body = String::new();
  for (name, file_name, value) in parts {
    body.push_str(&format!("--{}\r\n", boundary));
    match file_name {
      Some(file_name) => body.push_str(&format!(
        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/plain\r\n\r\n",
        name, file_name
      )),
      None => body.push_str(&format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)),
    }
    body.push_str(value);
    body.push_str("\r\n");
  }
  body.push_str(&format!("--{}--\r\n", boundary));
  body
}
