use std::net::SocketAddr;

use anyhow::Context;
use axum::{response::IntoResponse, routing::get, Router};
use tokio_graceful_shutdown::SubsystemHandle;
use tracing::info;

use crate::{resolver::SharedResolver, stream};

pub fn router(resolver: SharedResolver) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/stream", get(stream::get_stream))
    .with_state(resolver)
}

pub async fn serve(
  subsys: SubsystemHandle,
  addr: SocketAddr,
  resolver: SharedResolver,
) -> anyhow::Result<()> {
  let server = axum::Server::try_bind(&addr)
    .with_context(|| format!("failed to bind {addr}"))?
    .serve(router(resolver).into_make_service());

  info!("Listening on {}", server.local_addr());

  server
    .with_graceful_shutdown(subsys.on_shutdown_requested())
    .await
    .context("server error")?;

  info!("server stopped");
  Ok(())
}

async fn health() -> impl IntoResponse {
  "ok".to_owned()
}
