use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{ytdlp::Ytdlp, Error, Result};

use super::{Resolver, StreamPair, StreamResult};

// run `yt-dlp -f <selector> -g <url>` to get direct playback url(s).
// yt-dlp prints one url per selected stream, video before audio.
pub struct YtdlpSelector {
  ytdlp: Ytdlp,
}

impl YtdlpSelector {
  pub fn new(ytdlp: Ytdlp) -> Self {
    Self { ytdlp }
  }
}

#[async_trait]
impl Resolver for YtdlpSelector {
  async fn resolve(
    &self,
    video_url: &str,
    format: &str,
  ) -> Result<StreamResult> {
    let stdout = self.ytdlp.run(selector_args(format, video_url)).await?;
    let pair = parse_output(&stdout, format)?;
    debug!(video = %pair.video, audio = %pair.audio, "resolved stream");

    Ok(StreamResult::Pair(pair))
  }
}

/// `None` leaves the choice to yt-dlp's default, the best overall stream.
pub fn format_selector(format: &str) -> Option<&'static str> {
  match format {
    "mp4" => Some("bestvideo[ext=mp4]+bestaudio[ext=m4a]/mp4"),
    "mp3" | "audio" => Some("bestaudio"),
    _ => None,
  }
}

fn selector_args(format: &str, video_url: &str) -> Vec<String> {
  let mut args = vec![];
  if let Some(selector) = format_selector(format) {
    args.push("-f".to_string());
    args.push(selector.to_string());
  }
  args.push("-g".to_string());
  args.push(video_url.to_string());
  args
}

fn is_audio_format(format: &str) -> bool {
  format.contains("audio") || format.contains("mp3")
}

fn parse_output(stdout: &str, format: &str) -> Result<StreamPair> {
  let urls = stdout
    .trim_end()
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .collect::<Vec<_>>();

  match urls.as_slice() {
    [] => Err(Error::EmptyOutput),
    [url] if is_audio_format(format) => Ok(StreamPair {
      audio: url.to_string(),
      ..Default::default()
    }),
    [url] => Ok(StreamPair {
      video: url.to_string(),
      ..Default::default()
    }),
    [video, audio, rest @ ..] => {
      if !rest.is_empty() {
        warn!("ignoring {} extra line(s) from yt-dlp", rest.len());
      }

      Ok(StreamPair {
        video: video.to_string(),
        audio: audio.to_string(),
      })
    }
  }
}
