use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::Client;

pub struct HttpClientConfig {
  pub timeout: Option<Duration>,
}

impl HttpClientConfig {
  /// Client for the upstream connection pool.
  ///
  /// Redirects and cookies are left to the caller, and system proxy
  /// variables are ignored so requests always reach the target directly.
  pub fn to_client(self) -> Result<Client, reqwest::Error> {
    let HttpClientConfig { timeout } = self;
    let mut client_builder = reqwest::ClientBuilder::new().no_proxy();

    if let Some(timeout) = timeout {
      client_builder = client_builder.timeout(timeout);
    }

    let client = client_builder.redirect(Policy::none()).build()?;

    Ok(client)
  }
}
