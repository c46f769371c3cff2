// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const DEFAULT_CANONICAL_PATH: &str = "/usr/local/bin/kubectl";
pub const DEFAULT_RELEASE_URL: &str = "https://dl.k8s.io/release";
pub const DEFAULT_BINARY_NAME: &str = "kubectl";

/// Suffix of files that are still being downloaded.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Returns `<canonical>-<version>`.
pub fn versioned_path(canonical: &Path, version: &str) -> PathBuf {
    append_to_path(canonical, &format!("-{version}"))
}

/// Returns the path a download is streamed to before being moved into place.
pub fn partial_path(destination: &Path) -> PathBuf {
    append_to_path(destination, PARTIAL_SUFFIX)
}

// `Path::with_extension` would eat the last component of a version like `1.20.0`
fn append_to_path(path: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}
