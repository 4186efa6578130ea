// SPDX-FileCopyrightText: (C) 2020 Jason Ish <jason@codemonkey.net>
// SPDX-License-Identifier: MIT

// Clippy suppressions. These are the global ones I don't care about.
#![allow(clippy::needless_return)]
#![allow(clippy::redundant_field_names)]

pub mod config;
pub mod elastic;
pub mod error;
pub mod logger;
pub mod paths;
pub(crate) mod prelude;
pub mod resource;
pub mod template;
pub mod version;

pub use config::TemplateConfig;
pub use error::TemplateError;
pub use template::loader::{BeatInfo, Loader};
