use reqwest::header::{self, HeaderMap, HeaderName};

const PROXY_CONNECTION: &str = "proxy-connection";
const KEEP_ALIVE: &str = "keep-alive";

/// Every header name that has to be dropped before relaying `headers`,
/// including the ones listed in its `Connection` header.
pub fn hop_by_hop_names(headers: &HeaderMap) -> Vec<HeaderName> {
  let mut names: Vec<HeaderName> = vec![
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    HeaderName::from_static(PROXY_CONNECTION),
    HeaderName::from_static(KEEP_ALIVE),
  ];

  for value in headers.get_all(header::CONNECTION) {
    let Ok(value) = value.to_str() else {
      continue;
    };

    names.extend(
      value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| HeaderName::from_bytes(token.as_bytes()).ok()),
    );
  }

  names
}

pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
  for name in hop_by_hop_names(headers) {
    headers.remove(name);
  }
}
