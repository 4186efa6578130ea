// SPDX-FileCopyrightText: (C) 2020 Jason Ish <jason@codemonkey.net>
// SPDX-License-Identifier: MIT

use crate::prelude::*;

pub const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// The version used to name templates. Any pre-release suffix such as
/// "-dev" is dropped so templates are named by the release they belong to.
pub fn version() -> &'static str {
    VERSION.split('-').next().unwrap_or(VERSION)
}

pub fn log_version() {
    info!("This is template-loader version {}", VERSION);
}
