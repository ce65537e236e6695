use std::time::Duration;

use axum::{
  response::{IntoResponse, Response},
  Json,
};
use http::StatusCode;
use tracing::warn;

use crate::stream::Envelope;

#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error("Missing video URL")]
  MissingVideo,
  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    source: std::io::Error,
  },
  #[error("yt-dlp failed: {0}")]
  Extraction(String),
  #[error("yt-dlp timed out after {}s", .0.as_secs_f32())]
  Timeout(Duration),
  #[error("yt-dlp returned no stream url")]
  EmptyOutput,
  #[error("no format matching {0:?} found")]
  FormatNotFound(String),
  #[error("invalid yt-dlp json: {0}")]
  Json(#[from] serde_json::Error),
  #[error("IO error: {0}")]
  IO(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match self {
      // rejected before any yt-dlp call
      Error::MissingVideo => StatusCode::BAD_REQUEST,
      _ => {
        warn!("failed to resolve stream: {}", self);
        StatusCode::OK
      }
    };

    (status, Json(Envelope::failure(&self))).into_response()
  }
}
