// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::Args;
use comfy_table::Table;

use super::TABLE_FORMAT;
use crate::handlers::{store::BinaryStore, version::VersionResolver};
use crate::types::{Config, Version};

/// List installed kubectl versions.
#[derive(Args, Debug)]
pub struct Command;

impl Command {
    pub fn exec(&self, config: &Config) -> Result<()> {
        let store = BinaryStore::new(&config.canonical_path);
        let versions = store.list_versions()?;

        if versions.is_empty() {
            println!("No versions installed with kubectlx");
            return Ok(());
        }

        let active = if store.exists(store.canonical_path()) {
            VersionResolver::new().resolve(store.canonical_path())
        } else {
            None
        };
        print_table(&versions, active.as_ref());
        Ok(())
    }
}

fn print_table(versions: &[Version], active: Option<&Version>) {
    let mut table = Table::new();
    table
        .load_preset(TABLE_FORMAT)
        .set_header(vec!["Version", "Active"])
        .add_rows(versions.iter().map(|version| {
            vec![
                version.clone(),
                if Some(version) == active {
                    "*".to_string()
                } else {
                    String::new()
                },
            ]
        }));
    println!("{table}");
}
