//! Request rewriting ahead of forwarding.
//!
//! Every request gets the upstream's scheme and authority and the
//! `/prometheus` path prefix. Multipart form submissions are additionally
//! decoded and re-encoded as `application/x-www-form-urlencoded`.

use std::convert::Infallible;
use std::fmt::Display;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use bytes::Bytes;
use futures_util::{future, stream};
use multer::Multipart;
use thiserror::Error;

use crate::form_field_set::FormFieldSet;
use crate::payload_stream::PayloadStream;
use crate::proxy_request::{ProxyRequest, RequestBody};
use crate::upstream_target::UpstreamTarget;

pub const PATH_PREFIX: &str = "/prometheus";

/// Upper bound for the bytes of all non-file form values held in memory.
pub const MAX_FORM_MEMORY: usize = 32 << 20;

const MULTIPART_FORM_DATA: &str = "multipart/form-data";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Error)]
pub enum TransformError {
  #[error("malformed multipart form: {0}")]
  MalformedForm(String),
}

impl ResponseError for TransformError {
  fn status_code(&self) -> StatusCode {
    StatusCode::BAD_REQUEST
  }

  fn error_response(&self) -> HttpResponse {
    HttpResponse::BadRequest().body("Error parsing form data")
  }
}

fn malformed(err: impl Display) -> TransformError {
  TransformError::MalformedForm(err.to_string())
}

/// Points `request` at `target` and normalizes multipart bodies.
///
/// Returns the decoded fields when the body was converted, `None` when the
/// body was left untouched.
pub async fn transform(
  request: &mut ProxyRequest,
  target: &UpstreamTarget,
) -> Result<Option<FormFieldSet>, TransformError> {
  request.scheme = target.scheme().to_string();
  request.authority = target.authority().to_string();
  request.path = target.rewrite_path(&format!("{}{}", PATH_PREFIX, request.path));
  request.query = target.merge_query(request.query.as_deref());

  let content_type = match request.content_type() {
    Some(content_type) if content_type.starts_with(MULTIPART_FORM_DATA) => content_type.to_string(),
    _ => return Ok(None),
  };

  let body = std::mem::replace(&mut request.body, RequestBody::Bytes(Bytes::new()));
  let fields = decode_multipart(body, &content_type, MAX_FORM_MEMORY).await?;

  request.set_content_type(FORM_URLENCODED);
  request.set_body(Bytes::from(fields.encode()));

  Ok(Some(fields))
}

/// Reads the value fields of a multipart body. Parts carrying a non-empty
/// file name are skipped without being buffered.
pub async fn decode_multipart(
  body: RequestBody,
  content_type: &str,
  memory_limit: usize,
) -> Result<FormFieldSet, TransformError> {
  let boundary = multer::parse_boundary(content_type).map_err(malformed)?;

  let mut multipart = match body {
    RequestBody::Stream(payload) => Multipart::new(PayloadStream::spawn(payload), boundary),
    RequestBody::Bytes(bytes) => {
      let once = stream::once(future::ready(Ok::<Bytes, Infallible>(bytes)));
      Multipart::new(once, boundary)
    }
  };

  let mut fields = FormFieldSet::new();
  let mut buffered: usize = 0;

  while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
    // an empty filename is what browsers send for an untouched file input
    if matches!(field.file_name(), Some(file_name) if !file_name.is_empty()) {
      continue;
    }

    let name = match field.name() {
      Some(name) if !name.is_empty() => name.to_string(),
      _ => continue,
    };

    let mut value: Vec<u8> = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(malformed)? {
      buffered += chunk.len();
      if buffered > memory_limit {
        return Err(TransformError::MalformedForm(format!(
          "form values exceed {} bytes",
          memory_limit
        )));
      }
      value.extend_from_slice(&chunk);
    }

    let value = String::from_utf8(value).map_err(malformed)?;
    fields.append(name, value);
  }

  Ok(fields)
}
