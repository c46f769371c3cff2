// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Switch between locally installed versions of `kubectl`, downloading missing
//! versions on demand.
//!
//! The active binary lives at a canonical path and every other version is kept
//! next to it as `<canonical path>-<version>`. No locking is performed: two
//! invocations racing on the same canonical path can corrupt it.

pub mod commands;
pub mod error;
pub mod handlers;
pub mod paths;
pub mod types;
