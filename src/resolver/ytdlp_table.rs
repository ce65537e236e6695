use async_trait::async_trait;
use serde::Deserialize;

use crate::{ytdlp::Ytdlp, Error, Result};

use super::{FormatLink, Resolver, StreamResult};

const FALLBACK_FORMAT: &str = "best";

// run `yt-dlp -J` and pick a single entry out of the format table.
// -J always prints exactly one json object, even for playlist urls.
pub struct YtdlpTable {
  ytdlp: Ytdlp,
}

impl YtdlpTable {
  pub fn new(ytdlp: Ytdlp) -> Self {
    Self { ytdlp }
  }
}

#[derive(Deserialize, Debug)]
struct YtdlpOutput {
  #[serde(default)]
  formats: Vec<Format>,
}

#[derive(Deserialize, Debug, Clone)]
struct Format {
  format_id: String,
  #[serde(default)]
  url: String,
  #[serde(default)]
  ext: String,
}

#[async_trait]
impl Resolver for YtdlpTable {
  async fn resolve(
    &self,
    video_url: &str,
    format: &str,
  ) -> Result<StreamResult> {
    let stdout = self
      .ytdlp
      .run(["-J", "--no-playlist", video_url])
      .await?;
    let output: YtdlpOutput = serde_json::from_str(&stdout)?;

    let format = select_format(&output.formats, format)?;

    Ok(StreamResult::Format(FormatLink {
      url: format.url.clone(),
      format_id: format.format_id.clone(),
      ext: format.ext.clone(),
    }))
  }
}

fn select_format<'a>(
  formats: &'a [Format],
  wanted: &str,
) -> Result<&'a Format> {
  let wanted = match wanted {
    "" => FALLBACK_FORMAT,
    w => w,
  };

  formats
    .iter()
    .find(|f| f.format_id == wanted)
    .or_else(|| {
      formats
        .iter()
        .find(|f| f.format_id.contains(FALLBACK_FORMAT))
    })
    .ok_or_else(|| Error::FormatNotFound(wanted.to_string()))
}
