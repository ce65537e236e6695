use std::time::Duration;

use anyhow::Context;
use tokio_graceful_shutdown::{SubsystemBuilder, Toplevel};

mod config;
mod error;
mod keep_alive;
mod logging;
mod resolver;
mod server;
mod stream;
mod ytdlp;

pub use error::{Error, Result};

use config::Config;
use ytdlp::Ytdlp;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  logging::init_logging();

  let config = Config::from_env().context("invalid configuration")?;
  tracing::info!(?config.resolver, "starting stream-url-api");

  let resolver = resolver::build(config.resolver, Ytdlp::new(config.ytdlp));
  let addr = config.listen_addr;
  let keep_alive_url = config.keep_alive_url;
  let keep_alive_interval = config.keep_alive_interval;

  Toplevel::new(move |s| async move {
    s.start(SubsystemBuilder::new("server", move |subsys| {
      server::serve(subsys, addr, resolver)
    }));
    s.start(SubsystemBuilder::new("keep_alive", move |subsys| {
      keep_alive::keep_alive(subsys, keep_alive_url, keep_alive_interval)
    }));
  })
  .catch_signals()
  .handle_shutdown_requests(SHUTDOWN_TIMEOUT)
  .await
  .map_err(Into::into)
}
