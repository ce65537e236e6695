use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_graceful_shutdown::SubsystemHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Some hosts suspend an app that has seen no traffic for a while.
// Pinging our own public url keeps it awake.
pub async fn keep_alive(
  subsys: SubsystemHandle,
  target: Option<String>,
  interval: Duration,
) -> anyhow::Result<()> {
  let Some(url) = keep_alive_target(target) else {
    return Ok(());
  };

  let client = reqwest::Client::builder()
    .timeout(REQUEST_TIMEOUT)
    .build()?;

  info!("keep-alive pinging {} every {:?}", url, interval);
  ping_loop(&client, &url, interval, subsys.create_cancellation_token())
    .await;

  Ok(())
}

/// The url to ping, or `None` (logged, not an error) when the loop should
/// not run at all.
pub fn keep_alive_target(target: Option<String>) -> Option<String> {
  match target {
    Some(url) if is_valid_url(&url) => Some(url),
    Some(url) => {
      info!("Skipping keep-alive: invalid APP_URL {:?}", url);
      None
    }
    None => {
      info!("Skipping keep-alive: no APP_URL");
      None
    }
  }
}

pub fn is_valid_url(url: &str) -> bool {
  url.starts_with("http://") || url.starts_with("https://")
}

/// GET `url` once per `interval` until `cancel` fires. The first ping goes
/// out one full interval after the call.
pub async fn ping_loop(
  client: &reqwest::Client,
  url: &str,
  interval: Duration,
  cancel: CancellationToken,
) {
  let mut ticker = interval_at(Instant::now() + interval, interval);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

  loop {
    tokio::select! {
      _ = cancel.cancelled() => break,
      _ = ticker.tick() => {}
    }

    tokio::select! {
      _ = cancel.cancelled() => break,
      resp = client.get(url).send() => match resp {
        // body is not needed
        Ok(resp) => debug!("keep-alive ping: {}", resp.status()),
        Err(e) => warn!("keep-alive error: {}", e),
      },
    }
  }

  debug!("keep-alive stopped");
}
