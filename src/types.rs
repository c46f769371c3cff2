// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{
    fmt::{self, Display, Formatter},
    path::PathBuf,
    time::Duration,
};

use crate::paths::{DEFAULT_BINARY_NAME, DEFAULT_CANONICAL_PATH, DEFAULT_RELEASE_URL};

pub type Version = String;

pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Everything the engine needs to know about where binaries live and where
/// they come from.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Location of the active binary
    pub canonical_path: PathBuf,
    /// Base of the release server, without a trailing slash
    pub release_base_url: String,
    /// File name of the binary on the release server
    pub binary_name: String,
    /// Upper bound on a single download, connection included
    pub download_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canonical_path: PathBuf::from(DEFAULT_CANONICAL_PATH),
            release_base_url: DEFAULT_RELEASE_URL.to_string(),
            binary_name: DEFAULT_BINARY_NAME.to_string(),
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }
}

/// One executable on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub path: PathBuf,
    /// The version the caller asked for. Only used to name files that do not
    /// exist yet.
    pub requested_version: Option<Version>,
    /// The version the binary reports about itself. This one is authoritative.
    pub resolved_version: Option<Version>,
}

impl Binary {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            requested_version: None,
            resolved_version: None,
        }
    }

    pub fn requested(path: PathBuf, version: &str) -> Self {
        Self {
            path,
            requested_version: Some(version.to_string()),
            resolved_version: None,
        }
    }
}

/// What a successful switch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The canonical binary already reports the requested version; nothing was touched.
    AlreadyActive(Version),
    Activated {
        version: Version,
        /// Name the previously active binary was archived under, if there was one
        previous: Option<Version>,
        downloaded: bool,
    },
}

impl Display for SwitchOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyActive(version) => write!(f, "kubectl {version} is already active"),
            Self::Activated {
                version,
                previous: Some(previous),
                ..
            } => write!(f, "Switched from kubectl {previous} to {version}"),
            Self::Activated { version, .. } => write!(f, "Activated kubectl {version}"),
        }
    }
}
