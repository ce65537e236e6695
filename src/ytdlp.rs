use std::{io, process::Stdio};

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::{
  io::{AsyncBufReadExt, AsyncReadExt, BufReader},
  process::{ChildStderr, ChildStdout, Command},
  sync::Semaphore,
};
use tracing::{debug, info};

use crate::{config::YtdlpConfig, Error, Result};

// runs the yt-dlp executable named in the config. every subprocess the
// service spawns goes through here.
pub struct Ytdlp {
  config: YtdlpConfig,
  // limits the number of ytdlp processes alive at a time
  permits: Option<Semaphore>,
}

impl Ytdlp {
  pub fn new(config: YtdlpConfig) -> Self {
    if let Some(proxy) = &config.proxy {
      info!("yt-dlp using proxy: {}", redact_proxy(proxy));
    }

    let permits = config.concurrency.map(Semaphore::new);
    Self { config, permits }
  }

  /// Run yt-dlp with `args` and return its standard output.
  ///
  /// The timeout covers waiting for a free slot as well as the run itself.
  /// The child is killed when the timeout expires or when the returned
  /// future is dropped, e.g. because the client went away.
  pub async fn run<I, S>(&self, args: I) -> Result<String>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
  {
    let mut cmd = Command::new(&self.config.program);
    cmd.args(&self.config.extra_args);
    if let Some(proxy) = &self.config.proxy {
      cmd.arg("--proxy").arg(proxy);
    }
    cmd
      .args(args)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);

    tokio::time::timeout(self.config.timeout, self.run_command(cmd))
      .await
      .map_err(|_| Error::Timeout(self.config.timeout))?
  }

  async fn run_command(&self, mut cmd: Command) -> Result<String> {
    let _guard = match &self.permits {
      Some(permits) => Some(
        permits
          .acquire()
          .await
          .map_err(|e| Error::Extraction(e.to_string()))?,
      ),
      None => None,
    };

    debug!("running {:?}", cmd.as_std());
    let mut child = cmd.spawn().map_err(|source| Error::Spawn {
      program: self.config.program.clone(),
      source,
    })?;
    let stdout = child.stdout.take().ok_or_else(|| not_captured("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| not_captured("stderr"))?;

    let (stdout, stderr, status) =
      tokio::try_join!(read_stdout(stdout), log_stderr(stderr), child.wait())?;

    if !status.success() {
      return Err(Error::Extraction(failure_message(
        &stderr,
        &status.to_string(),
      )));
    }

    Ok(stdout)
  }
}

async fn read_stdout(mut stdout: ChildStdout) -> io::Result<String> {
  let mut buf = Vec::new();
  stdout.read_to_end(&mut buf).await?;
  Ok(String::from_utf8_lossy(&buf).into_owned())
}

// forwarded line by line as it arrives, so nothing is lost when the call
// times out
async fn log_stderr(stderr: ChildStderr) -> io::Result<Vec<String>> {
  let mut reader = BufReader::new(stderr);
  let mut buf = Vec::new();
  let mut lines = Vec::new();

  loop {
    buf.clear();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
      break;
    }

    let line = String::from_utf8_lossy(&buf).trim().to_string();
    if line.is_empty() {
      continue;
    }
    info!(target: "yt-dlp", "{}", line);
    lines.push(line);
  }

  Ok(lines)
}

fn not_captured(stream: &str) -> Error {
  Error::IO(io::Error::new(
    io::ErrorKind::Other,
    format!("yt-dlp {stream} was not captured"),
  ))
}

// prefer yt-dlp's own "ERROR:" lines over the rest of the noise on stderr
fn failure_message(stderr: &[String], status: &str) -> String {
  let errors = stderr
    .iter()
    .filter(|l| l.contains("ERROR:"))
    .map(String::as_str)
    .collect::<Vec<_>>();

  if !errors.is_empty() {
    return errors.join("\n");
  }

  match stderr.join("\n") {
    s if s.is_empty() => status.to_string(),
    s => s,
  }
}

// used to remove cred info from proxy url before printing
static AUTH_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"//[^:/@]+(:[^@]+)?@").unwrap());

pub fn redact_proxy(proxy: &str) -> String {
  AUTH_REGEX.replace(proxy, "//<REDACTED>@").into_owned()
}
