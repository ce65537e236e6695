use axum::{
  extract::{Query, State},
  Json,
};
use serde::Serialize;
use tracing::info;

use crate::{
  resolver::{SharedResolver, StreamResult},
  Error, Result,
};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct StreamRequest {
  video: Option<String>,
  format: String,
}

impl StreamRequest {
  // a repeated parameter keeps its first value instead of failing the
  // request with a non-JSON rejection
  fn from_pairs(pairs: Vec<(String, String)>) -> Self {
    let mut req = Self::default();
    let mut format = None;

    for (key, value) in pairs {
      match key.as_str() {
        "video" if req.video.is_none() => req.video = Some(value),
        "format" if format.is_none() => format = Some(value),
        _ => {}
      }
    }

    req.format = format.unwrap_or_default();
    req
  }
}

/// The JSON body of every `/stream` response.
#[derive(Serialize, Debug)]
pub struct Envelope {
  pub status: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stream: Option<StreamResult>,
}

impl Envelope {
  pub fn success(stream: StreamResult) -> Self {
    Self {
      status: true,
      message: None,
      stream: Some(stream),
    }
  }

  pub fn failure(err: &Error) -> Self {
    Self {
      status: false,
      message: Some(err.to_string()),
      stream: None,
    }
  }
}

pub async fn get_stream(
  State(resolver): State<SharedResolver>,
  Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Envelope>> {
  let req = StreamRequest::from_pairs(pairs);
  let video = req
    .video
    .filter(|v| !v.trim().is_empty())
    .ok_or(Error::MissingVideo)?;

  info!(video = %video, format = %req.format, "resolving stream");
  let stream = resolver.resolve(&video, &req.format).await?;

  Ok(Json(Envelope::success(stream)))
}
