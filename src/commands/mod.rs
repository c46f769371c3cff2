// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

mod current;
mod list;
mod remove;
mod switch;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::paths::{DEFAULT_BINARY_NAME, DEFAULT_CANONICAL_PATH, DEFAULT_RELEASE_URL};
use crate::types::Config;

pub const TABLE_FORMAT: &str = "  ── ══      ──    ";

/// Switch between installed kubectl versions, downloading missing ones.
///
/// Not safe to run concurrently against the same kubectl path.
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    arg_required_else_help = true,
    args_conflicts_with_subcommands = true,
    disable_help_subcommand = true,
    subcommand_negates_reqs = true
)]
pub struct Command {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    switch: switch::Command,

    /// Location of the active kubectl binary. Versions are stored next to it.
    #[arg(long, env = "KUBECTLX_PATH", default_value = DEFAULT_CANONICAL_PATH, global = true)]
    pub path: PathBuf,

    /// Base URL of the kubectl release server.
    #[arg(long, env = "KUBECTLX_RELEASE_URL", default_value = DEFAULT_RELEASE_URL, global = true)]
    pub release_url: String,

    /// Give up on a download after this many seconds.
    #[arg(long, env = "KUBECTLX_TIMEOUT", default_value_t = 300, global = true)]
    pub timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    List(list::Command),
    Current(current::Command),
    Remove(remove::Command),
}

impl Command {
    pub async fn exec(&self) -> Result<()> {
        let config = self.config();
        match &self.command {
            Some(Commands::List(cmd)) => cmd.exec(&config),
            Some(Commands::Current(cmd)) => cmd.exec(&config),
            Some(Commands::Remove(cmd)) => cmd.exec(&config),
            None => self.switch.exec(&config).await,
        }
    }

    pub fn config(&self) -> Config {
        Config {
            canonical_path: self.path.clone(),
            release_base_url: self.release_url.trim_end_matches('/').to_string(),
            binary_name: DEFAULT_BINARY_NAME.to_string(),
            download_timeout: Duration::from_secs(self.timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{error::ErrorKind, CommandFactory};

    #[test]
    fn verify_command() {
        super::Command::command().debug_assert();
    }

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Command::try_parse_from(std::iter::once("kubectlx").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_version() {
        let cmd = parse(&["1.20.0", "--yes"]).unwrap();
        assert!(cmd.command.is_none());
        assert_eq!(cmd.switch.version.as_deref(), Some("1.20.0"));
        assert!(cmd.switch.yes);
    }

    #[test]
    fn test_parse_list() {
        let cmd = parse(&["list"]).unwrap();
        assert!(matches!(cmd.command, Some(Commands::List(_))));
        assert!(cmd.switch.version.is_none());
    }

    #[test]
    fn test_no_arguments_is_a_usage_error() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn test_two_versions_is_a_usage_error() {
        let err = parse(&["1.19.0", "1.20.0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_version_and_subcommand_is_a_usage_error() {
        for args in [&["1.19.0", "list"][..], &["list", "1.19.0"][..]] {
            let err = parse(args).unwrap_err();
            assert_eq!(err.exit_code(), 2, "{args:?}");
        }
    }

    #[test]
    fn test_config_from_arguments() {
        let cmd = parse(&[
            "list",
            "--path",
            "/opt/bin/kubectl",
            "--release-url",
            "http://mirror.local/release/",
            "--timeout",
            "5",
        ])
        .unwrap();
        assert_eq!(
            cmd.config(),
            Config {
                canonical_path: PathBuf::from("/opt/bin/kubectl"),
                release_base_url: "http://mirror.local/release".to_string(),
                binary_name: "kubectl".to_string(),
                download_timeout: Duration::from_secs(5),
            }
        );
    }
}
