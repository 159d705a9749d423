use std::net::IpAddr;

use actix_web::body::SizedStream;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Body, Client, Response};
use thiserror::Error;

use crate::hop_headers::{hop_by_hop_names, strip_hop_by_hop};
use crate::payload_stream::PayloadStream;
use crate::proxy_request::{ProxyRequest, RequestBody};

const X_FORWARDED_FOR: &str = "x-forwarded-for";

#[derive(Debug, Error)]
pub enum ForwardError {
  #[error("upstream timed out: {0}")]
  Timeout(#[source] reqwest::Error),
  #[error("upstream unreachable: {0}")]
  Unreachable(#[source] reqwest::Error),
}

impl From<reqwest::Error> for ForwardError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      ForwardError::Timeout(err)
    } else {
      ForwardError::Unreachable(err)
    }
  }
}

impl ResponseError for ForwardError {
  fn status_code(&self) -> StatusCode {
    match self {
      ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
      ForwardError::Unreachable(_) => StatusCode::BAD_GATEWAY,
    }
  }

  fn error_response(&self) -> HttpResponse {
    HttpResponse::new(self.status_code())
  }
}

/// Sends transformed requests to the upstream and relays what comes back.
#[derive(Clone)]
pub struct Forwarder {
  http_client: Client,
}

impl Forwarder {
  pub fn new(http_client: Client) -> Self {
    Self { http_client }
  }

  pub async fn forward(&self, request: ProxyRequest) -> Result<HttpResponse, ForwardError> {
    let response = self.send(request).await?;

    Ok(Forwarder::relay(response))
  }

  /// Issues the request and waits for the upstream response head.
  pub async fn send(&self, request: ProxyRequest) -> Result<Response, ForwardError> {
    let url = request.url();
    let ProxyRequest {
      method,
      mut headers,
      body,
      content_length,
      peer_addr,
      ..
    } = request;

    // decided before the hop-by-hop pass removes Transfer-Encoding
    let has_body = content_length.map_or(false, |length| length > 0)
      || headers.contains_key(header::TRANSFER_ENCODING);

    // Host passes through; the client only fills it in when absent
    strip_hop_by_hop(&mut headers);

    if let Some(peer_addr) = peer_addr {
      append_forwarded_for(&mut headers, peer_addr.ip());
    }

    let mut builder = self.http_client.request(method, url).headers(headers);
    match body {
      RequestBody::Bytes(bytes) if !bytes.is_empty() => builder = builder.body(bytes),
      RequestBody::Stream(payload) if has_body => {
        builder = builder.body(Body::wrap_stream(PayloadStream::spawn(payload)))
      }
      _ => {}
    }

    Ok(builder.send().await?)
  }

  /// Copies status, headers and a streaming body into the caller's response.
  pub fn relay(response: Response) -> HttpResponse {
    let mut http_response = HttpResponse::build(response.status());
    let skipped = hop_by_hop_names(response.headers());
    let mut declared_length: Option<u64> = None;

    for (name, value) in response.headers() {
      if skipped.contains(name) {
        continue;
      }

      if *name == header::CONTENT_LENGTH {
        declared_length = value.to_str().ok().and_then(|value| value.parse::<u64>().ok());
        continue;
      }

      http_response.append_header((name.clone(), value.clone()));
    }

    let body_stream = response.bytes_stream();
    match declared_length {
      Some(length) => http_response.body(SizedStream::new(length, body_stream)),
      None => http_response.streaming(body_stream),
    }
  }
}

fn append_forwarded_for(headers: &mut HeaderMap, client_ip: IpAddr) {
  let name = HeaderName::from_static(X_FORWARDED_FOR);

  let prior: Vec<&str> = headers
    .get_all(&name)
    .iter()
    .filter_map(|value| value.to_str().ok())
    .collect();

  let forwarded_for = if prior.is_empty() {
    client_ip.to_string()
  } else {
    format!("{}, {}", prior.join(", "), client_ip)
  };

  if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
    headers.insert(name, value);
  }
}
