// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use anyhow::{bail, Result};
use clap::Args;

use crate::handlers::{store::BinaryStore, version::VersionResolver};
use crate::types::Config;

/// Show the version of the active kubectl binary.
#[derive(Args, Debug)]
pub struct Command;

impl Command {
    pub fn exec(&self, config: &Config) -> Result<()> {
        let store = BinaryStore::new(&config.canonical_path);
        let canonical = store.canonical_path();
        if !store.exists(canonical) {
            bail!("No kubectl found at {}", canonical.display());
        }

        match VersionResolver::new().resolve(canonical) {
            Some(version) => println!("{version}"),
            None => bail!("Cannot determine the version of {}", canonical.display()),
        }
        Ok(())
    }
}
