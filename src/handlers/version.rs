// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::Path;
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::SwitchError;
use crate::types::Version;

lazy_static! {
    static ref CLIENT_VERSION: Regex = Regex::new(r"Client Version: v(\S+)").unwrap();
}

/// Prefix of the name a binary is archived under when it cannot tell us its
/// version. Requested versions must start with a digit, so this never clashes.
pub const UNKNOWN_VERSION_PREFIX: &str = "unknown";

const SPAWN_ATTEMPTS: u32 = 5;
const SPAWN_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Older releases only print the short form with `--short`, newer ones reject
/// the flag and print it by default.
const VERSION_ARGS: &[&[&str]] = &[
    &["version", "--client=true", "--short"],
    &["version", "--client=true"],
];

/// Asks a binary which version it is. File names are not trusted.
#[derive(Debug, Default, Clone)]
pub struct VersionResolver;

impl VersionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Returns `None` when the binary cannot be run or does not report a
    /// version in the expected format.
    pub fn resolve(&self, path: &Path) -> Option<Version> {
        for args in VERSION_ARGS {
            let output = match run(path, args) {
                Ok(output) => output,
                Err(e) => {
                    debug!("Cannot run {}: {e}", path.display());
                    return None;
                }
            };

            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));

            if let Some(version) = extract_client_version(&combined) {
                debug!("{} reports version {version}", path.display());
                return Some(version);
            }
        }
        debug!("Could not resolve the version of {}", path.display());
        None
    }
}

fn run(path: &Path, args: &[&str]) -> io::Result<Output> {
    let mut attempts = 1;
    loop {
        match Command::new(path).args(args).output() {
            // a freshly written binary can still be held open by a concurrently forked child
            Err(e) if is_text_file_busy(&e) && attempts < SPAWN_ATTEMPTS => {
                attempts += 1;
                thread::sleep(SPAWN_RETRY_DELAY);
            }
            result => return result,
        }
    }
}

fn is_text_file_busy(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::ExecutableFileBusy
}

/// Extracts the version from `kubectl version` output.
pub fn extract_client_version(output: &str) -> Option<Version> {
    CLIENT_VERSION
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| normalize_version(m.as_str()))
        .filter(|v| !v.is_empty())
}

/// Trims whitespace and a single leading `v`.
pub fn normalize_version(version: &str) -> Version {
    let version = version.trim();
    version.strip_prefix('v').unwrap_or(version).to_string()
}

/// Normalizes a version coming from the command line and rejects anything that
/// could not be a release identifier or would escape the store directory.
pub fn validate_requested(version: &str) -> Result<Version, SwitchError> {
    let normalized = normalize_version(version);
    let starts_with_digit = normalized
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit());
    let clean = normalized
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'));

    if !starts_with_digit || !clean {
        return Err(SwitchError::InvalidVersion(version.to_string()));
    }
    Ok(normalized)
}

/// Whether `name` is one of the names given to binaries that could not report
/// their version, `unknown-<secs>` or `unknown-<secs>-<n>`.
pub fn is_unknown_archive(name: &str) -> bool {
    name.strip_prefix(UNKNOWN_VERSION_PREFIX)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|rest| {
            rest.starts_with(|c: char| c.is_ascii_digit())
                && !rest.ends_with('-')
                && rest.chars().all(|c| c.is_ascii_digit() || c == '-')
        })
}

/// Like [`validate_requested`], but also accepts the names of archived
/// binaries with an unknown version. Used where a stored version is picked by
/// name rather than fetched.
pub fn validate_installed(version: &str) -> Result<Version, SwitchError> {
    let trimmed = version.trim();
    if is_unknown_archive(trimmed) {
        return Ok(trimmed.to_string());
    }
    validate_requested(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_version() {
        assert_eq!(normalize_version("v1.20.0\n"), "1.20.0");
        assert_eq!(normalize_version("  1.20.0 "), "1.20.0");
        assert_eq!(normalize_version("vv1"), "v1");
        assert_eq!(normalize_version(""), "");
    }

    #[test]
    fn test_extract_short_output() {
        assert_eq!(
            extract_client_version("Client Version: v1.19.3\n"),
            Some("1.19.3".to_string())
        );
    }

    #[test]
    fn test_extract_new_style_output() {
        let out = "Client Version: v1.29.2\nKustomize Version: v5.0.4-0.20230601165947-6ce0bf390ce3\n";
        assert_eq!(extract_client_version(out), Some("1.29.2".to_string()));
    }

    #[test]
    fn test_extract_no_match() {
        assert_eq!(extract_client_version("error: unknown flag: --short"), None);
        assert_eq!(extract_client_version("Client Version: 1.19.3"), None);
        assert_eq!(extract_client_version(""), None);
    }

    #[test]
    fn test_validate_requested() {
        assert_eq!(validate_requested("v1.20.0").unwrap(), "1.20.0");
        assert_eq!(validate_requested(" 1.30.0-rc.1 ").unwrap(), "1.30.0-rc.1");

        for bad in ["", "v", "unknown", "latest", "../1.2.0", "1.2.0/../x", "1 2"] {
            assert!(
                matches!(validate_requested(bad), Err(SwitchError::InvalidVersion(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_unknown_archive_names() {
        for name in ["unknown-1700000000", "unknown-1700000000-2"] {
            assert!(is_unknown_archive(name), "{name:?} should be accepted");
            assert_eq!(validate_installed(name).unwrap(), name);
        }
        for name in ["unknown", "unknown-", "unknown-x", "unknown-1/../x", "unknown-1-"] {
            assert!(!is_unknown_archive(name), "{name:?} should be rejected");
            assert!(validate_installed(name).is_err());
        }
        assert_eq!(validate_installed("v1.20.0").unwrap(), "1.20.0");
        assert!(validate_requested("unknown-1700000000").is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_text_file_busy_is_recognized() {
        // ETXTBSY
        assert!(is_text_file_busy(&io::Error::from_raw_os_error(26)));
        assert!(!is_text_file_busy(&io::Error::from(io::ErrorKind::NotFound)));
    }

    #[test]
    fn test_resolve_missing_binary() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(VersionResolver::new().resolve(&dir.path().join("kubectl")), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_runs_binary() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kubectl");
        std::fs::write(&path, "#!/bin/sh\necho 'Client Version: v1.21.4' >&2\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(
            VersionResolver::new().resolve(&path),
            Some("1.21.4".to_string())
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_falls_back_without_short() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kubectl");
        let script = r#"#!/bin/sh
for arg in "$@"; do
  if [ "$arg" = "--short" ]; then
    echo "error: unknown flag: --short" >&2
    exit 1
  fi
done
echo "Client Version: v1.29.2"
echo "Kustomize Version: v5.0.4"
"#;
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(
            VersionResolver::new().resolve(&path),
            Some("1.29.2".to_string())
        );
    }
}
