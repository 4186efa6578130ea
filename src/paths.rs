// SPDX-FileCopyrightText: (C) 2020 Jason Ish <jason@codemonkey.net>
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

/// The configuration directory that relative paths in the configuration
/// are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        let config = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(config)
    }
}

impl Paths {
    pub fn new<P: Into<PathBuf>>(config: P) -> Self {
        Self {
            config: config.into(),
        }
    }

    /// Resolve path against the configuration directory. Absolute paths are
    /// returned unchanged.
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.config.join(path)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_resolve() {
        let paths = Paths::new("/etc/loader");
        assert_eq!(
            paths.resolve("fields.yml"),
            PathBuf::from("/etc/loader/fields.yml")
        );
        assert_eq!(
            paths.resolve("conf.d/fields.yml"),
            PathBuf::from("/etc/loader/conf.d/fields.yml")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_absolute() {
        let paths = Paths::new("/etc/loader");
        assert_eq!(
            paths.resolve("/path/to/custom.yml"),
            PathBuf::from("/path/to/custom.yml")
        );
    }
}
