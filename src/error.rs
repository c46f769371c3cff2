// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::types::Version;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error("cannot remove {}: {source}", .path.display())]
    Remove { path: PathBuf, source: io::Error },
    #[error("cannot read version store {}: {source}", .dir.display())]
    Unreadable { dir: PathBuf, source: io::Error },
    #[error("version {0} is not installed")]
    NotInstalled(Version),
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("download timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("download cancelled")]
    Cancelled,
    #[error("download incomplete: got {written} of {expected} bytes")]
    Incomplete { expected: u64, written: u64 },
    #[error("cannot write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

#[derive(Error, Debug)]
pub enum SwitchError {
    #[error("invalid version '{0}': expected something like 1.20.0")]
    InvalidVersion(String),
    #[error("download of version {0} declined")]
    UserDeclined(Version),
    #[error("cannot read confirmation: {0}")]
    Prompt(#[source] io::Error),
    #[error("cannot download version {version}: {source}")]
    Download {
        version: Version,
        source: DownloadError,
    },
    #[error(
        "downloaded binary reports version {}, expected {requested}; removed {}",
        .resolved.as_deref().unwrap_or("<unknown>"),
        .path.display()
    )]
    Validation {
        requested: Version,
        resolved: Option<Version>,
        path: PathBuf,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}
