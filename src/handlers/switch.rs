// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{StoreError, SwitchError};
use crate::handlers::download::Fetch;
use crate::handlers::store::BinaryStore;
use crate::handlers::version::{
    is_unknown_archive, validate_installed, VersionResolver, UNKNOWN_VERSION_PREFIX,
};
use crate::handlers::Confirm;
use crate::types::{Binary, SwitchOutcome, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ResolveCurrent,
    CheckDesired,
    ConfirmDownload,
    Download,
    Validate,
    ArchiveCurrent,
    Activate,
    Done,
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::ResolveCurrent => "resolve-current",
            State::CheckDesired => "check-desired",
            State::ConfirmDownload => "confirm-download",
            State::Download => "download",
            State::Validate => "validate",
            State::ArchiveCurrent => "archive-current",
            State::Activate => "activate",
            State::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// Puts a requested version at the canonical path, downloading it first if
/// needed.
///
/// Nothing on disk changes until the desired binary is known to be good: the
/// download goes to its own versioned path and is validated there, and only
/// then is the active binary archived and replaced. Declining the download,
/// a failed download and a failed validation all leave the canonical path
/// untouched.
///
/// A binary that could not report its version is archived as
/// `unknown-<secs>`. Such an archive can be switched back to by name; it is
/// never downloaded and, having no version to check, never validated.
pub struct SwitchEngine<F, C> {
    store: BinaryStore,
    resolver: VersionResolver,
    fetcher: F,
    confirm: C,
}

impl<F: Fetch, C: Confirm> SwitchEngine<F, C> {
    pub fn new(store: BinaryStore, resolver: VersionResolver, fetcher: F, confirm: C) -> Self {
        Self {
            store,
            resolver,
            fetcher,
            confirm,
        }
    }

    pub fn store(&self) -> &BinaryStore {
        &self.store
    }

    /// Version of the active binary, if there is one and it can be resolved.
    pub fn current(&self) -> Option<Version> {
        let canonical = self.store.canonical_path();
        if !self.store.exists(canonical) {
            return None;
        }
        self.resolver.resolve(canonical)
    }

    pub async fn switch(
        &self,
        requested: &str,
        cancel: &CancellationToken,
    ) -> Result<SwitchOutcome, SwitchError> {
        let version = validate_installed(requested)?;
        let unknown = is_unknown_archive(&version);

        transition(State::ResolveCurrent);
        let mut current = Binary::new(self.store.canonical_path().to_path_buf());
        let current_exists = self.store.exists(&current.path);
        if current_exists {
            current.resolved_version = self.resolver.resolve(&current.path);
        }

        if !unknown && current.resolved_version.as_deref() == Some(version.as_str()) {
            info!("kubectl {version} is already active");
            return Ok(SwitchOutcome::AlreadyActive(version));
        }

        transition(State::CheckDesired);
        let mut desired = Binary::requested(self.store.versioned_path(&version), &version);
        let downloaded = !self.store.exists(&desired.path);
        if unknown {
            if downloaded {
                return Err(StoreError::NotInstalled(version).into());
            }
            if current_exists
                && current.resolved_version.is_none()
                && self.store.same_contents(&current.path, &desired.path)
            {
                info!("kubectl {version} is already active");
                return Ok(SwitchOutcome::AlreadyActive(version));
            }
        }

        if downloaded {
            transition(State::ConfirmDownload);
            let question = format!("kubectl {version} is not installed. Do you want to download it?");
            if !self.confirm.confirm(&question).map_err(SwitchError::Prompt)? {
                return Err(SwitchError::UserDeclined(version));
            }

            transition(State::Download);
            if let Err(source) = self.fetcher.fetch(&version, &desired.path, cancel).await {
                self.discard(&desired.path);
                return Err(SwitchError::Download { version, source });
            }

            transition(State::Validate);
            desired.resolved_version = self.resolver.resolve(&desired.path);
            if desired.resolved_version.as_deref() != Some(version.as_str()) {
                self.discard(&desired.path);
                return Err(SwitchError::Validation {
                    requested: version,
                    resolved: desired.resolved_version,
                    path: desired.path,
                });
            }
        }

        let previous = if current_exists {
            transition(State::ArchiveCurrent);
            Some(match &current.resolved_version {
                Some(name) => {
                    self.store
                        .copy(&current.path, &self.store.versioned_path(name))?;
                    name.clone()
                }
                None => self.archive_unknown(&current.path)?,
            })
        } else {
            None
        };

        transition(State::Activate);
        self.store.copy(&desired.path, &current.path)?;

        transition(State::Done);
        Ok(SwitchOutcome::Activated {
            version,
            previous,
            downloaded,
        })
    }

    /// Archives a binary of unknown version, reusing an existing unknown
    /// archive with the same contents instead of piling up copies.
    fn archive_unknown(&self, path: &Path) -> Result<Version, SwitchError> {
        for name in self.store.list_versions()? {
            if is_unknown_archive(&name)
                && self
                    .store
                    .same_contents(path, &self.store.versioned_path(&name))
            {
                debug!("{} is already archived as {name}", path.display());
                return Ok(name);
            }
        }

        let name = self.unknown_version_name();
        warn!(
            "Cannot determine the version of {}, archiving it as {name}",
            path.display()
        );
        self.store.copy(path, &self.store.versioned_path(&name))?;
        Ok(name)
    }

    /// `unknown-<secs>`, with a counter appended if that name is taken.
    fn unknown_version_name(&self) -> Version {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let base = format!("{UNKNOWN_VERSION_PREFIX}-{secs}");
        let mut name = base.clone();
        let mut n = 1;
        while self.store.exists(&self.store.versioned_path(&name)) {
            n += 1;
            name = format!("{base}-{n}");
        }
        name
    }

    fn discard(&self, path: &Path) {
        if let Err(e) = self.store.remove(path) {
            warn!("{e}");
        }
    }
}

fn transition(state: State) {
    debug!("switch: {state}");
}
