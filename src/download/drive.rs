//! Google Drive single-file downloader.
//!
//! Drive answers large or unscannable files with a warning page and a
//! `download_warning*` cookie. The token in that cookie has to be echoed back
//! as `confirm` on a second request before the real content is served.

use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::LazyLock;

use futures::{Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use reqwest::{Client, Response};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_DRIVE_DOWNLOAD_URL};
use crate::error::{FrankError, Result};

/// Cookie name prefix carrying the confirmation token.
pub const CONFIRM_TOKEN_PREFIX: &str = "download_warning";

/// Write granularity for downloaded content (32 KiB).
pub const CHUNK_SIZE: usize = 32 * 1024;

/// File name used when the response carries no usable `Content-Disposition`.
pub const DEFAULT_FILE_NAME: &str = "downloaded_file";

static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"filename="(.+)""#).expect("Invalid regex"));

/// Extract the file id from a Drive share link, or return a bare id unchanged.
///
/// Example link: `https://drive.google.com/file/d/<id>/view?usp=sharing`
pub fn extract_file_id(input: &str) -> Result<String> {
    if !input.starts_with("http") {
        return Ok(input.to_string());
    }

    let id = input
        .find("/d/")
        .map(|pos| &input[pos + 3..])
        .and_then(|rest| rest.split(['/', '?', '#']).next())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            FrankError::InvalidLink(format!("could not extract a file id from '{input}'"))
        })?;

    Ok(id.to_string())
}

/// Return the confirmation token if Drive set one in the response cookies.
pub fn confirm_token(response: &Response) -> Option<String> {
    response
        .cookies()
        .find(|cookie| cookie.name().starts_with(CONFIRM_TOKEN_PREFIX))
        .map(|cookie| cookie.value().to_string())
}

/// File name announced by `Content-Disposition: ...; filename="<name>"`.
///
/// Only the final path component is kept so the header cannot point outside
/// the output directory. Non-ASCII names are decoded as UTF-8.
pub fn file_name_from_headers(headers: &HeaderMap) -> Option<String> {
    let disposition = String::from_utf8_lossy(headers.get(CONTENT_DISPOSITION)?.as_bytes());

    let raw = FILENAME_RE.captures(&disposition)?.get(1)?.as_str();

    Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

/// Downloader for publicly shared Drive files.
pub struct DriveDownloader {
    client: Client,
    download_url: String,
    show_progress: bool,
}

impl DriveDownloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            download_url: DEFAULT_DRIVE_DOWNLOAD_URL.to_string(),
            show_progress: true,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new()?.with_download_url(config.drive_download_url.clone()))
    }

    /// Use a different download endpoint.
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = url.into();
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Download the file behind a share link (or bare id) into `output_dir`.
    pub async fn download_from_link(&self, link: &str, output_dir: &Path) -> Result<PathBuf> {
        let file_id = extract_file_id(link)?;
        self.download_by_id(&file_id, output_dir).await
    }

    /// Download a file by id into `output_dir`, returning the written path.
    pub async fn download_by_id(&self, file_id: &str, output_dir: &Path) -> Result<PathBuf> {
        info!("Requesting Drive file {}", file_id);

        let response = self.request(file_id, None).await?;

        let response = match confirm_token(&response) {
            Some(token) => {
                debug!("Drive requested confirmation, retrying with token");
                self.request(file_id, Some(&token)).await?
            }
            None => response,
        };

        let file_name = file_name_from_headers(response.headers()).unwrap_or_else(|| {
            debug!("No file name in response headers, using {}", DEFAULT_FILE_NAME);
            DEFAULT_FILE_NAME.to_string()
        });

        let destination = output_dir.join(file_name);
        self.save_response_content(response, &destination).await
    }

    async fn request(&self, file_id: &str, confirm: Option<&str>) -> Result<Response> {
        let mut params = vec![("id", file_id)];
        if let Some(token) = confirm {
            params.push(("confirm", token));
        }

        let response = self
            .client
            .get(&self.download_url)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FrankError::Transport(format!(
                "Drive download endpoint returned {status}"
            )));
        }

        Ok(response)
    }

    /// Stream the body into `destination` via a `.part` file renamed on success.
    async fn save_response_content(
        &self,
        response: Response,
        destination: &Path,
    ) -> Result<PathBuf> {
        let progress = self.progress_bar(response.content_length());
        save_stream(response.bytes_stream(), destination, &progress).await
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        match total {
            Some(len) => {
                let pb = ProgressBar::new(len);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("Downloading [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("#>-"),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} Downloading {bytes} ({bytes_per_sec})")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                pb
            }
        }
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

/// Stream into `destination` through a `.part` sibling.
///
/// The partial file is renamed on success and removed on failure, so the
/// final name only ever holds complete content.
async fn save_stream<S, B, E>(
    stream: S,
    destination: &Path,
    progress: &ProgressBar,
) -> Result<PathBuf>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<FrankError>,
{
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await?;
    }

    let partial = partial_path(destination);

    match write_chunks(stream, &partial, progress).await {
        Ok(written) => {
            fs::rename(&partial, destination).await?;
            progress.finish_and_clear();
            info!("Downloaded {} bytes to {}", written, destination.display());
            Ok(destination.to_path_buf())
        }
        Err(e) => {
            progress.abandon();
            if let Err(cleanup) = fs::remove_file(&partial).await {
                warn!("Failed to remove {}: {}", partial.display(), cleanup);
            }
            Err(e)
        }
    }
}

/// Write a byte stream to `path` in [`CHUNK_SIZE`] pieces, returning the byte count.
async fn write_chunks<S, B, E>(stream: S, path: &Path, progress: &ProgressBar) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<FrankError>,
{
    let mut stream = pin!(stream);
    let mut file = fs::File::create(path).await?;
    let mut written = 0u64;

    while let Some(item) = stream.next().await {
        let bytes = item.map_err(Into::into)?;
        // An empty frame yields no chunks.
        for chunk in bytes.as_ref().chunks(CHUNK_SIZE) {
            file.write_all(chunk).await?;
            written += chunk.len() as u64;
            progress.inc(chunk.len() as u64);
        }
    }

    file.flush().await?;
    Ok(written)
}
