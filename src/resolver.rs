mod ytdlp;
mod ytdlp_table;

use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;

use crate::{ytdlp::Ytdlp, Result};

pub use self::ytdlp::YtdlpSelector;
pub use ytdlp_table::YtdlpTable;

/// Direct media urls for one video.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum StreamResult {
  Pair(StreamPair),
  Format(FormatLink),
}

/// A side that yt-dlp didn't produce is left empty.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamPair {
  pub video: String,
  pub audio: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FormatLink {
  pub url: String,
  pub format_id: String,
  pub ext: String,
}

#[async_trait]
pub trait Resolver: Send + Sync {
  async fn resolve(&self, video_url: &str, format: &str)
    -> Result<StreamResult>;
}

pub type SharedResolver = Arc<dyn Resolver>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolverKind {
  /// `yt-dlp -f <selector> -g`, answering with a video/audio pair.
  #[default]
  Selector,
  /// `yt-dlp -j`, picking one entry of the format table by id.
  FormatTable,
}

#[derive(thiserror::Error, Debug)]
#[error("unknown resolver {0:?}, expected \"selector\" or \"format-table\"")]
pub struct UnknownResolver(String);

impl FromStr for ResolverKind {
  type Err = UnknownResolver;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "selector" => Ok(Self::Selector),
      "format-table" => Ok(Self::FormatTable),
      other => Err(UnknownResolver(other.to_string())),
    }
  }
}

pub fn build(kind: ResolverKind, ytdlp: Ytdlp) -> SharedResolver {
  match kind {
    ResolverKind::Selector => Arc::new(YtdlpSelector::new(ytdlp)),
    ResolverKind::FormatTable => Arc::new(YtdlpTable::new(ytdlp)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_stream_result_json() {
    let pair = StreamResult::Pair(StreamPair {
      video: "V".into(),
      audio: "A".into(),
    });
    assert_eq!(
      serde_json::to_value(&pair).unwrap(),
      serde_json::json!({"video": "V", "audio": "A"})
    );

    let link = StreamResult::Format(FormatLink {
      url: "U".into(),
      format_id: "18".into(),
      ext: "mp4".into(),
    });
    assert_eq!(
      serde_json::to_value(&link).unwrap(),
      serde_json::json!({"url": "U", "format_id": "18", "ext": "mp4"})
    );
  }

  #[test]
  fn test_resolver_kind_from_str() {
    assert_eq!(
      "selector".parse::<ResolverKind>().unwrap(),
      ResolverKind::Selector
    );
    assert_eq!(
      "format-table".parse::<ResolverKind>().unwrap(),
      ResolverKind::FormatTable
    );
    assert!("Selector".parse::<ResolverKind>().is_err());
  }
}
