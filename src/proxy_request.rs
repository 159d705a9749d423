use std::net::SocketAddr;

use actix_web::dev::Payload;
use actix_web::HttpRequest;
use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Method;

pub enum RequestBody {
  /// The inbound payload, not read yet.
  Stream(Payload),
  Bytes(Bytes),
}

/// An inbound request on its way to the upstream.
///
/// Built from the actix request head and payload, then mutated in place by
/// the transformer before the forwarder sends it.
pub struct ProxyRequest {
  pub method: Method,
  pub scheme: String,
  pub authority: String,
  pub path: String,
  pub query: Option<String>,
  pub headers: HeaderMap,
  pub body: RequestBody,
  pub content_length: Option<u64>,
  pub peer_addr: Option<SocketAddr>,
}

impl ProxyRequest {
  pub fn from_parts(http_request: &HttpRequest, payload: Payload) -> ProxyRequest {
    let mut headers = HeaderMap::with_capacity(http_request.headers().len());
    for (name, value) in http_request.headers().iter() {
      headers.append(name.clone(), value.clone());
    }

    let content_length = headers
      .get(header::CONTENT_LENGTH)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.parse::<u64>().ok());

    let connection_info = http_request.connection_info();

    ProxyRequest {
      method: http_request.method().clone(),
      scheme: connection_info.scheme().to_string(),
      authority: connection_info.host().to_string(),
      path: http_request.path().to_string(),
      query: Some(http_request.query_string())
        .filter(|query| !query.is_empty())
        .map(String::from),
      headers,
      body: RequestBody::Stream(payload),
      content_length,
      peer_addr: http_request.peer_addr(),
    }
  }

  pub fn content_type(&self) -> Option<&str> {
    self
      .headers
      .get(header::CONTENT_TYPE)
      .and_then(|value| value.to_str().ok())
  }

  pub fn set_content_type(&mut self, content_type: &'static str) {
    self
      .headers
      .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
  }

  /// Replaces the body along with its declared length.
  pub fn set_body(&mut self, body: Bytes) {
    let length = body.len() as u64;

    self.headers.remove(header::TRANSFER_ENCODING);
    self.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    self.content_length = Some(length);
    self.body = RequestBody::Bytes(body);
  }

  pub fn url(&self) -> String {
    match &self.query {
      Some(query) => format!("{}://{}{}?{}", self.scheme, self.authority, self.path, query),
      None => format!("{}://{}{}", self.scheme, self.authority, self.path),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::test::TestRequest;

  #[test]
  fn copies_request_head() {
    let (http_request, payload) = TestRequest::post()
      .uri("/api/v1/query?query=up")
      .insert_header((header::CONTENT_TYPE, "text/plain"))
      .insert_header((header::CONTENT_LENGTH, "5"))
      .set_payload("hello")
      .to_srv_request()
      .into_parts();

    let request = ProxyRequest::from_parts(&http_request, payload);

    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/api/v1/query");
    assert_eq!(request.query.as_deref(), Some("query=up"));
    assert_eq!(request.content_type(), Some("text/plain"));
    assert_eq!(request.content_length, Some(5));
  }

  #[test]
  fn set_body_updates_declared_length() {
    let (http_request, payload) = TestRequest::post()
      .insert_header((header::TRANSFER_ENCODING, "chunked"))
      .to_srv_request()
      .into_parts();
    let mut request = ProxyRequest::from_parts(&http_request, payload);

    request.set_body(Bytes::from_static(b"name=Alice"));

    assert_eq!(request.content_length, Some(10));
    assert_eq!(request.headers.get(header::CONTENT_LENGTH).unwrap(), "10");
    assert!(request.headers.get(header::TRANSFER_ENCODING).is_none());
    assert!(matches!(request.body, RequestBody::Bytes(ref body) if body.as_ref() == b"name=Alice"));
  }
}
