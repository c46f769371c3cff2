// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::Args;

use crate::handlers::{store::BinaryStore, version::validate_installed};
use crate::types::Config;

/// Remove an installed kubectl version. The active binary is not touched.
#[derive(Args, Debug)]
pub struct Command {
    /// Version to remove, e.g. '1.19.0' or an archived 'unknown-<secs>'
    version: String,
}

impl Command {
    pub fn exec(&self, config: &Config) -> Result<()> {
        let version = validate_installed(&self.version)?;
        let path = BinaryStore::new(&config.canonical_path).remove_version(&version)?;
        println!("Removed {}", path.display());
        Ok(())
    }
}
