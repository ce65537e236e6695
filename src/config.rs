use std::{
  net::{IpAddr, SocketAddr},
  str::FromStr,
  time::Duration,
};

use anyhow::{bail, Context};

use crate::resolver::ResolverKind;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_YTDLP_PATH: &str = "yt-dlp";
const DEFAULT_YTDLP_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct Config {
  pub listen_addr: SocketAddr,
  pub resolver: ResolverKind,
  pub ytdlp: YtdlpConfig,
  pub keep_alive_url: Option<String>,
  pub keep_alive_interval: Duration,
}

/// How to invoke the yt-dlp executable.
#[derive(Debug, Clone)]
pub struct YtdlpConfig {
  pub program: String,
  /// Placed in front of every invocation's own arguments.
  pub extra_args: Vec<String>,
  pub timeout: Duration,
  /// Upper bound on concurrently running yt-dlp processes, unbounded if
  /// `None`.
  pub concurrency: Option<usize>,
  pub proxy: Option<String>,
}

impl Default for YtdlpConfig {
  fn default() -> Self {
    Self {
      program: DEFAULT_YTDLP_PATH.to_string(),
      extra_args: vec![],
      timeout: DEFAULT_YTDLP_TIMEOUT,
      concurrency: None,
      proxy: None,
    }
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub fn from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
  ) -> anyhow::Result<Self> {
    // empty values count as unset
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
    // accept "::1" as well as "[::1]"
    let ip = host
      .trim()
      .trim_start_matches('[')
      .trim_end_matches(']')
      .parse::<IpAddr>()
      .with_context(|| format!("invalid value for HOST: {host:?}"))?;
    let port = parse_var(&get, "PORT")?.unwrap_or(DEFAULT_PORT);
    let listen_addr = SocketAddr::new(ip, port);

    let resolver = parse_var(&get, "STREAM_RESOLVER")?.unwrap_or_default();

    let concurrency = parse_var::<usize>(&get, "YTDLP_CONCURRENCY")?;
    if concurrency == Some(0) {
      bail!("YTDLP_CONCURRENCY must be at least 1");
    }

    let ytdlp = YtdlpConfig {
      program: get("YTDLP_PATH")
        .unwrap_or_else(|| DEFAULT_YTDLP_PATH.to_string()),
      extra_args: get("YTDLP_EXTRA_ARGS")
        .map(|args| args.split_whitespace().map(String::from).collect())
        .unwrap_or_default(),
      timeout: parse_var(&get, "YTDLP_TIMEOUT_SECS")?
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_YTDLP_TIMEOUT),
      concurrency,
      proxy: get("YTDLP_PROXY"),
    };

    let keep_alive_interval = parse_var(&get, "KEEP_ALIVE_INTERVAL_SECS")?
      .map(Duration::from_secs)
      .unwrap_or(DEFAULT_KEEP_ALIVE_INTERVAL);
    if keep_alive_interval.is_zero() {
      bail!("KEEP_ALIVE_INTERVAL_SECS must be at least 1");
    }

    Ok(Self {
      listen_addr,
      resolver,
      ytdlp,
      keep_alive_url: get("APP_URL"),
      keep_alive_interval,
    })
  }
}

fn parse_var<T>(
  get: &impl Fn(&str) -> Option<String>,
  key: &str,
) -> anyhow::Result<Option<T>>
where
  T: FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  get(key)
    .map(|value| {
      value
        .trim()
        .parse::<T>()
        .with_context(|| format!("invalid value for {key}: {value:?}"))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
    let vars: HashMap<String, String> = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    Config::from_lookup(|key| vars.get(key).cloned())
  }

  #[test]
  fn test_defaults() {
    let config = config_from(&[]).unwrap();

    let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
    assert_eq!(config.listen_addr, addr);
    assert_eq!(config.resolver, ResolverKind::Selector);
    assert_eq!(config.ytdlp.program, "yt-dlp");
    assert!(config.ytdlp.extra_args.is_empty());
    assert_eq!(config.ytdlp.timeout, Duration::from_secs(60));
    assert_eq!(config.ytdlp.concurrency, None);
    assert_eq!(config.ytdlp.proxy, None);
    assert_eq!(config.keep_alive_url, None);
    assert_eq!(config.keep_alive_interval, Duration::from_secs(300));
  }

  #[test]
  fn test_overrides() {
    let config = config_from(&[
      ("HOST", "127.0.0.1"),
      ("PORT", "10000"),
      ("STREAM_RESOLVER", "format-table"),
      ("YTDLP_PATH", "/opt/bin/yt-dlp"),
      ("YTDLP_EXTRA_ARGS", "--no-warnings  --cookies /tmp/c.txt"),
      ("YTDLP_TIMEOUT_SECS", "15"),
      ("YTDLP_CONCURRENCY", "2"),
      ("YTDLP_PROXY", "socks5://127.0.0.1:1080"),
      ("APP_URL", "https://example.com/health"),
      ("KEEP_ALIVE_INTERVAL_SECS", "30"),
    ])
    .unwrap();

    let addr: SocketAddr = "127.0.0.1:10000".parse().unwrap();
    assert_eq!(config.listen_addr, addr);
    assert_eq!(config.resolver, ResolverKind::FormatTable);
    assert_eq!(config.ytdlp.program, "/opt/bin/yt-dlp");
    assert_eq!(
      config.ytdlp.extra_args,
      vec!["--no-warnings", "--cookies", "/tmp/c.txt"]
    );
    assert_eq!(config.ytdlp.timeout, Duration::from_secs(15));
    assert_eq!(config.ytdlp.concurrency, Some(2));
    assert_eq!(
      config.ytdlp.proxy.as_deref(),
      Some("socks5://127.0.0.1:1080")
    );
    assert_eq!(
      config.keep_alive_url.as_deref(),
      Some("https://example.com/health")
    );
    assert_eq!(config.keep_alive_interval, Duration::from_secs(30));
  }

  #[test]
  fn test_ipv6_host() {
    let config = config_from(&[("HOST", "::"), ("PORT", "10000")]).unwrap();
    let addr: SocketAddr = "[::]:10000".parse().unwrap();
    assert_eq!(config.listen_addr, addr);

    let config = config_from(&[("HOST", "[::1]")]).unwrap();
    let addr: SocketAddr = "[::1]:8080".parse().unwrap();
    assert_eq!(config.listen_addr, addr);
  }

  #[test]
  fn test_empty_values_are_unset() {
    let config = config_from(&[("APP_URL", ""), ("PORT", "  ")]).unwrap();

    assert_eq!(config.keep_alive_url, None);
    assert_eq!(config.listen_addr.port(), 8080);
  }

  #[test]
  fn test_invalid_values() {
    let err = config_from(&[("PORT", "eighty")]).unwrap_err();
    assert!(err.to_string().contains("PORT"));

    assert!(config_from(&[("YTDLP_CONCURRENCY", "0")]).is_err());
    assert!(config_from(&[("KEEP_ALIVE_INTERVAL_SECS", "0")]).is_err());
    assert!(config_from(&[("STREAM_RESOLVER", "magic")]).is_err());
    assert!(config_from(&[("HOST", "not a host")]).is_err());
  }
}
