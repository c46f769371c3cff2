// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::error::StoreError;
use crate::paths::{versioned_path, PARTIAL_SUFFIX};
use crate::types::Version;

/// The active binary plus every version archived or downloaded next to it.
#[derive(Debug, Clone)]
pub struct BinaryStore {
    canonical: PathBuf,
}

impl BinaryStore {
    pub fn new(canonical: impl Into<PathBuf>) -> Self {
        Self {
            canonical: canonical.into(),
        }
    }

    pub fn canonical_path(&self) -> &Path {
        &self.canonical
    }

    pub fn versioned_path(&self, version: &str) -> PathBuf {
        versioned_path(&self.canonical, version)
    }

    /// A missing file is an expected state, so this never fails.
    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Lists the versions stored next to the canonical binary, sorted.
    pub fn list_versions(&self) -> Result<Vec<Version>, StoreError> {
        let dir = self.dir();
        let prefix = format!("{}-", self.file_name());

        let entries = fs::read_dir(&dir).map_err(|source| StoreError::Unreadable {
            dir: dir.clone(),
            source,
        })?;

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Unreadable {
                dir: dir.clone(),
                source,
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(version) = name.strip_prefix(&prefix) else {
                continue;
            };
            if version.is_empty() || version.ends_with(PARTIAL_SUFFIX) {
                continue;
            }
            if entry.path().is_file() {
                versions.push(version.to_string());
            }
        }
        versions.sort();
        Ok(versions)
    }

    /// Copies `from` over `to` and marks the result executable. Returns the
    /// number of bytes copied.
    pub fn copy(&self, from: &Path, to: &Path) -> Result<u64, StoreError> {
        info!("Copying from {} to {}", from.display(), to.display());
        copy_executable(from, to).map_err(|source| StoreError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
    }

    /// Whether both files can be read and hold the same bytes.
    pub fn same_contents(&self, a: &Path, b: &Path) -> bool {
        match (fs::metadata(a), fs::metadata(b)) {
            (Ok(ma), Ok(mb)) if ma.len() == mb.len() => {}
            _ => return false,
        }
        matches!((fs::read(a), fs::read(b)), (Ok(x), Ok(y)) if x == y)
    }

    /// Deletes `path` if it is there.
    pub fn remove(&self, path: &Path) -> Result<(), StoreError> {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("File removed: {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Remove {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Deletes an archived version. The canonical binary is left alone even if
    /// it is a copy of this version.
    pub fn remove_version(&self, version: &str) -> Result<PathBuf, StoreError> {
        let path = self.versioned_path(version);
        if !self.exists(&path) {
            return Err(StoreError::NotInstalled(version.to_string()));
        }
        self.remove(&path)?;
        Ok(path)
    }

    fn dir(&self) -> PathBuf {
        match self.canonical.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn file_name(&self) -> String {
        self.canonical
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn copy_executable(from: &Path, to: &Path) -> io::Result<u64> {
    let mut src = File::open(from)?;

    // unlinking first lets us replace a binary that is currently running
    if to.exists() {
        fs::remove_file(to)?;
    }

    let mut dst = File::create(to)?;
    let copied = io::copy(&mut src, &mut dst)?;
    dst.sync_all()?;

    set_executable_permissions(to)?;
    Ok(copied)
}

#[cfg(unix)]
pub(crate) fn set_executable_permissions(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
pub(crate) fn set_executable_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
