use std::fmt::{Display, Formatter};

use url::Url;

use crate::app_config::ConfigError;

/// The single backend every request is forwarded to.
///
/// Resolved once at startup and shared read-only by all workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
  scheme: Box<str>,
  authority: Box<str>,
  base_path: Box<str>,
  query: Option<Box<str>>,
}

impl UpstreamTarget {
  pub fn parse(raw_url: &str) -> Result<UpstreamTarget, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidTarget {
      url: raw_url.to_string(),
      reason: reason.to_string(),
    };

    let url = Url::parse(raw_url).map_err(|err| invalid(&err.to_string()))?;

    match url.scheme() {
      "http" | "https" => {}
      other => return Err(invalid(&format!("unsupported scheme '{}'", other))),
    }

    let host = match url.host_str() {
      Some(host) if !host.is_empty() => host,
      _ => return Err(invalid("missing host")),
    };

    if !url.username().is_empty() || url.password().is_some() {
      return Err(invalid("credentials are not supported"));
    }

    let authority = match url.port() {
      Some(port) => format!("{}:{}", host, port),
      None => host.to_string(),
    };

    Ok(UpstreamTarget {
      scheme: Box::from(url.scheme()),
      authority: authority.into_boxed_str(),
      base_path: Box::from(url.path().trim_end_matches('/')),
      query: url.query().filter(|query| !query.is_empty()).map(Box::from),
    })
  }

  pub fn scheme(&self) -> &str {
    &self.scheme
  }

  pub fn authority(&self) -> &str {
    &self.authority
  }

  pub fn base_path(&self) -> &str {
    &self.base_path
  }

  pub fn query(&self) -> Option<&str> {
    self.query.as_deref()
  }

  /// Target query first, then the request's own, joined with `&`.
  pub fn merge_query(&self, request_query: Option<&str>) -> Option<String> {
    let request_query = request_query.filter(|query| !query.is_empty());

    match (self.query.as_deref(), request_query) {
      (Some(target), Some(request)) => Some(format!("{}&{}", target, request)),
      (Some(target), None) => Some(target.to_string()),
      (None, request) => request.map(String::from),
    }
  }

  /// Places a request path under the target's base path.
  pub fn rewrite_path(&self, path: &str) -> String {
    join_paths(&self.base_path, path)
  }
}

impl Display for UpstreamTarget {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}://{}{}", self.scheme, self.authority, self.base_path)
  }
}

// Exactly one slash between the base path and the request path.
fn join_paths(base: &str, path: &str) -> String {
  match (base.ends_with('/'), path.starts_with('/')) {
    (true, true) => format!("{}{}", base, &path[1..]),
    (false, false) => format!("{}/{}", base, path),
    _ => format!("{}{}", base, path),
  }
}
