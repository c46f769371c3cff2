// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::cmp::min;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::DownloadError;
use crate::handlers::store::set_executable_permissions;
use crate::paths::partial_path;
use crate::types::Config;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches one release of the binary to a local path.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Downloads `version` to `destination` and returns the number of bytes
    /// written. On error nothing is left at `destination`.
    async fn fetch(
        &self,
        version: &str,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError>;
}

/// Detects the current OS and architecture, named the way the release server
/// names them.
pub fn detect_os_arch() -> Result<(String, String), DownloadError> {
    let os = match whoami::platform() {
        whoami::Platform::Linux => "linux",
        whoami::Platform::MacOS => "darwin",
        whoami::Platform::Windows => "windows",
        other => return Err(DownloadError::UnsupportedPlatform(format!("{other:?}"))),
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "arm" => "arm",
        "powerpc64" => "ppc64le",
        "s390x" => "s390x",
        other => return Err(DownloadError::UnsupportedPlatform(other.to_string())),
    };

    debug!("Detected: {os}-{arch}");
    Ok((os.to_string(), arch.to_string()))
}

/// `<base>/v<version>/bin/<os>/<arch>/<binary>`
pub fn release_url(base: &str, version: &str, os: &str, arch: &str, binary: &str) -> String {
    format!(
        "{}/v{version}/bin/{os}/{arch}/{binary}",
        base.trim_end_matches('/')
    )
}

/// Downloads releases over HTTP.
pub struct HttpDownloader {
    client: Client,
    base_url: String,
    binary_name: String,
    /// Detected on first use when not given, so local switches work on any host.
    platform: Option<(String, String)>,
    timeout: Duration,
    connect_timeout: Duration,
}

impl HttpDownloader {
    pub fn new(config: &Config) -> Result<Self, DownloadError> {
        Self::build(config, None)
    }

    pub fn for_platform(config: &Config, os: &str, arch: &str) -> Result<Self, DownloadError> {
        Self::build(config, Some((os.to_string(), arch.to_string())))
    }

    fn build(config: &Config, platform: Option<(String, String)>) -> Result<Self, DownloadError> {
        let connect_timeout = min(CONNECT_TIMEOUT, config.download_timeout);
        let client = Client::builder()
            .user_agent(concat!("kubectlx/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|source| DownloadError::Request {
                url: config.release_base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.release_base_url.clone(),
            binary_name: config.binary_name.clone(),
            platform,
            timeout: config.download_timeout,
            connect_timeout,
        })
    }

    pub fn url(&self, version: &str) -> Result<String, DownloadError> {
        let (os, arch) = match &self.platform {
            Some(platform) => platform.clone(),
            None => detect_os_arch()?,
        };
        Ok(release_url(
            &self.base_url,
            version,
            &os,
            &arch,
            &self.binary_name,
        ))
    }

    async fn download_to(&self, url: &str, path: &Path) -> Result<u64, DownloadError> {
        let request_error = |source: reqwest::Error| {
            if source.is_timeout() {
                DownloadError::Timeout(if source.is_connect() {
                    self.connect_timeout
                } else {
                    self.timeout
                })
            } else {
                DownloadError::Request {
                    url: url.to_string(),
                    source,
                }
            }
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status,
            });
        }

        let expected = response.content_length();
        let io_error = |source| DownloadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let pb = match expected {
            Some(total) => ProgressBar::new(total),
            None => ProgressBar::new_spinner(),
        };
        if let Ok(style) = ProgressStyle::default_bar().template(
            "Downloading: {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}",
        ) {
            pb.set_style(style.progress_chars("=>-"));
        }

        let mut file = File::create(path).map_err(io_error)?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        let start = Instant::now();

        while let Some(item) = stream.next().await {
            let chunk = item.map_err(request_error)?;
            file.write_all(&chunk).map_err(io_error)?;
            written += chunk.len() as u64;
            pb.set_position(written);

            let elapsed = start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                let speed = written as f64 / elapsed;
                pb.set_message(format!("Speed: {}/s", HumanBytes(speed as u64)));
            }
        }
        file.flush().map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        pb.finish_and_clear();

        if let Some(expected) = expected {
            if written != expected {
                return Err(DownloadError::Incomplete { expected, written });
            }
        }
        Ok(written)
    }
}

#[async_trait]
impl Fetch for HttpDownloader {
    async fn fetch(
        &self,
        version: &str,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        let url = self.url(version)?;
        let partial = partial_path(destination);
        debug!("Downloading {url} to {}", partial.display());

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DownloadError::Cancelled),
            r = tokio::time::timeout(self.timeout, self.download_to(&url, &partial)) => {
                r.unwrap_or(Err(DownloadError::Timeout(self.timeout)))
            }
        };

        let finished = result.and_then(|written| {
            fs::rename(&partial, destination)
                .and_then(|()| set_executable_permissions(destination))
                .map(|()| written)
                .map_err(|source| DownloadError::Io {
                    path: destination.to_path_buf(),
                    source,
                })
        });

        if finished.is_err() {
            for leftover in [partial.as_path(), destination] {
                if let Err(e) = fs::remove_file(leftover) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!("Cannot remove {}: {e}", leftover.display());
                    }
                }
            }
        }
        finished
    }
}
