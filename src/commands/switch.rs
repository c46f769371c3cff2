// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::handlers::{
    download::HttpDownloader, store::BinaryStore, switch::SwitchEngine, version::VersionResolver,
    AssumeYes, Confirm, Prompt,
};
use crate::types::{Config, SwitchOutcome};

/// How long a blocked prompt gets to notice Ctrl-C before the process is torn down.
const INTERRUPT_GRACE: Duration = Duration::from_secs(1);

// Flattened into the top-level command, so no doc comment: it would replace `about`.
#[derive(Args, Debug)]
pub struct Command {
    /// Version to activate, e.g. '1.20.0' or 'v1.20.0'
    #[arg(required = true)]
    pub version: Option<String>,

    /// Download missing versions without asking
    #[arg(short, long)]
    pub yes: bool,
}

impl Command {
    pub async fn exec(&self, config: &Config) -> Result<()> {
        let Some(version) = &self.version else {
            anyhow::bail!("No version given");
        };

        if self.yes {
            switch(config, version, AssumeYes).await
        } else {
            switch(config, version, Prompt::stdin()).await
        }
    }
}

async fn switch<C: Confirm>(config: &Config, version: &str, confirm: C) -> Result<()> {
    let engine = SwitchEngine::new(
        BinaryStore::new(&config.canonical_path),
        VersionResolver::new(),
        HttpDownloader::new(config)?,
        confirm,
    );

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                cancel.cancel();
                // the engine may be blocked on the prompt rather than the download
                tokio::time::sleep(INTERRUPT_GRACE).await;
                std::process::exit(130);
            }
        })
    };

    let result = engine.switch(version, &cancel).await;
    interrupt.abort();

    match result? {
        outcome @ SwitchOutcome::AlreadyActive(_) => println!("{outcome}"),
        outcome => println!("{}", outcome.to_string().green()),
    }
    Ok(())
}
