use std::convert::Infallible;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::upstream_target::UpstreamTarget;

const DEFAULT_TARGET_URL: &str = "http://localhost:9090";
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WORKER_COUNT: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid target url '{url}': {reason}")]
  InvalidTarget { url: String, reason: String },
  #[error("unable to read config file '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("unable to parse config file: {0}")]
  Yaml(#[from] serde_yaml::Error),
  #[error("invalid value for {name}: {reason}")]
  InvalidValue { name: &'static str, reason: String },
}

/// Command line, with every option also readable from the environment.
#[derive(Parser, Debug, Default)]
#[command(name = "prefix_proxy", version, about = "Reverse proxy that prefixes request paths and flattens multipart forms")]
pub struct CliArgs {
  /// Upstream base URL.
  #[arg(long, env = "TARGET_URL")]
  pub target_url: Option<String>,

  /// Verbose per-request logging. Only the value `true` enables it.
  #[arg(long, env = "DEBUG", num_args = 0..=1, default_missing_value = "true", value_parser = parse_debug_flag)]
  pub debug: Option<bool>,

  #[arg(long, env = "HTTP_BIND")]
  pub bind: Option<String>,

  #[arg(long, env = "HTTP_PORT")]
  pub port: Option<u16>,

  #[arg(long, env = "HTTP_WORKER_COUNT")]
  pub worker_count: Option<usize>,

  /// Deadline for a whole upstream exchange; unset waits indefinitely.
  #[arg(long, env = "UPSTREAM_TIMEOUT_SECS")]
  pub upstream_timeout_secs: Option<u64>,

  /// Optional YAML file with the same settings.
  #[arg(long = "config", env = "PROXY_CONF_LOCATION")]
  pub config_file: Option<PathBuf>,
}

fn parse_debug_flag(value: &str) -> Result<bool, Infallible> {
  Ok(value == "true")
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct ConfigFile {
  pub target_url: Option<String>,
  pub debug: Option<bool>,
  pub bind: Option<String>,
  pub port: Option<u16>,
  pub worker_count: Option<usize>,
  pub upstream_timeout_secs: Option<u64>,
}

impl ConfigFile {
  pub fn load_from_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;

    Ok(serde_yaml::from_reader(file)?)
  }
}

/// Settings resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
  pub target: UpstreamTarget,
  pub debug: bool,
  pub bind: String,
  pub port: u16,
  pub worker_count: usize,
  pub upstream_timeout: Option<Duration>,
}

impl AppConfig {
  pub fn resolve(args: CliArgs) -> Result<AppConfig, ConfigError> {
    let file = match &args.config_file {
      Some(path) => ConfigFile::load_from_file(path)?,
      None => ConfigFile::default(),
    };

    AppConfig::merge(args, file)
  }

  /// Command line and environment win over the file, the file over defaults.
  pub fn merge(args: CliArgs, file: ConfigFile) -> Result<AppConfig, ConfigError> {
    let target_url = args
      .target_url
      .or(file.target_url)
      .unwrap_or_else(|| DEFAULT_TARGET_URL.to_string());
    let target = UpstreamTarget::parse(&target_url)?;

    let worker_count = args.worker_count.or(file.worker_count).unwrap_or(DEFAULT_WORKER_COUNT);
    if worker_count == 0 {
      return Err(ConfigError::InvalidValue {
        name: "worker_count",
        reason: "must be at least 1".to_string(),
      });
    }

    let upstream_timeout = match args.upstream_timeout_secs.or(file.upstream_timeout_secs) {
      Some(0) => {
        return Err(ConfigError::InvalidValue {
          name: "upstream_timeout_secs",
          reason: "must be greater than 0".to_string(),
        })
      }
      secs => secs.map(Duration::from_secs),
    };

    Ok(AppConfig {
      target,
      debug: args.debug.or(file.debug).unwrap_or(false),
      bind: args.bind.or(file.bind).unwrap_or_else(|| DEFAULT_BIND.to_string()),
      port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
      worker_count,
      upstream_timeout,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn defaults_match_reference_deployment() {
    let config = AppConfig::merge(CliArgs::default(), ConfigFile::default()).unwrap();

    assert_eq!(config.target.to_string(), "http://localhost:9090");
    assert!(!config.debug);
    assert_eq!(config.bind, "0.0.0.0");
    assert_eq!(config.port, 8080);
    assert_eq!(config.worker_count, 4);
    assert_eq!(config.upstream_timeout, None);
  }

  #[test]
  fn arguments_override_file() {
    let args = CliArgs {
      target_url: Some("http://prometheus:9090".into()),
      port: Some(9000),
      ..CliArgs::default()
    };
    let file = ConfigFile {
      target_url: Some("http://other:1234".into()),
      port: Some(7000),
      debug: Some(true),
      upstream_timeout_secs: Some(30),
      ..ConfigFile::default()
    };

    let config = AppConfig::merge(args, file).unwrap();

    assert_eq!(config.target.authority(), "prometheus:9090");
    assert_eq!(config.port, 9000);
    assert!(config.debug);
    assert_eq!(config.upstream_timeout, Some(Duration::from_secs(30)));
  }

  #[test]
  fn invalid_target_fails_resolution() {
    let args = CliArgs {
      target_url: Some("::not-a-url".into()),
      ..CliArgs::default()
    };

    let result = AppConfig::merge(args, ConfigFile::default());

    assert!(matches!(result, Err(ConfigError::InvalidTarget { .. })));
  }

  #[test]
  fn zero_workers_are_rejected() {
    let args = CliArgs {
      worker_count: Some(0),
      ..CliArgs::default()
    };

    assert!(matches!(
      AppConfig::merge(args, ConfigFile::default()),
      Err(ConfigError::InvalidValue { name: "worker_count", .. })
    ));
  }

  #[test]
  fn debug_flag_only_accepts_literal_true() {
    let args = CliArgs::try_parse_from(["prefix_proxy", "--debug"]).unwrap();
    assert_eq!(args.debug, Some(true));

    let args = CliArgs::try_parse_from(["prefix_proxy", "--debug", "TRUE"]).unwrap();
    assert_eq!(args.debug, Some(false));

    let args = CliArgs::try_parse_from(["prefix_proxy", "--debug", "true"]).unwrap();
    assert_eq!(args.debug, Some(true));
  }

  #[test]
  fn loads_yaml_file() {
    let path = std::env::temp_dir().join(format!("prefix_proxy_{}.yaml", std::process::id()));
    let mut file = File::create(&path).unwrap();
    writeln!(file, "target_url: http://backend:9091/base\nport: 8181\nworker_count: 2").unwrap();

    let loaded = ConfigFile::load_from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.target_url.as_deref(), Some("http://backend:9091/base"));
    assert_eq!(loaded.port, Some(8181));
    assert_eq!(loaded.worker_count, Some(2));
    assert_eq!(loaded.debug, None);
  }

  #[test]
  fn missing_file_is_an_io_error() {
    let result = ConfigFile::load_from_file(Path::new("/nonexistent/prefix_proxy.yaml"));

    assert!(matches!(result, Err(ConfigError::Io { .. })));
  }
}
