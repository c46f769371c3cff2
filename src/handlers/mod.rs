// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::cell::RefCell;
use std::io::{self, BufRead, Write};

pub mod download;
pub mod store;
pub mod switch;
pub mod version;

/// Answers the yes/no question asked before a missing version is downloaded.
#[cfg_attr(test, mockall::automock)]
pub trait Confirm {
    fn confirm(&self, question: &str) -> io::Result<bool>;
}

/// Always says yes. Backs the `--yes` flag.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _question: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Interactive `[y/N]` prompt. Keeps asking until it gets a recognizable answer.
pub struct Prompt<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
}

impl Prompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }
}

impl<R: BufRead, W: Write> Confirm for Prompt<R, W> {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        let mut input = self.input.borrow_mut();
        let mut output = self.output.borrow_mut();
        loop {
            write!(output, "{question} [y/N] ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "no answer on standard input",
                ));
            }

            match line.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "" | "n" | "no" => return Ok(false),
                _ => writeln!(output, "Invalid input. Please enter 'y' or 'n'.")?,
            }
        }
    }
}
