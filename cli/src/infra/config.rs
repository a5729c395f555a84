//! Infrastructure implementation of the `OptionsStore` port.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tfharness_options::Options;

use crate::application::ports::OptionsStore;

/// Environment variable naming the options file when `--options` is absent.
pub const OPTIONS_ENV: &str = "TFHARNESS_OPTIONS";

/// `Options` read from a YAML file on disk.
pub struct YamlOptionsFile {
    path: PathBuf,
}

impl YamlOptionsFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file named by `flag`, else by `TFHARNESS_OPTIONS`, else none.
    #[must_use]
    pub fn resolve(flag: Option<PathBuf>) -> Option<Self> {
        flag.or_else(|| std::env::var_os(OPTIONS_ENV).map(PathBuf::from))
            .map(Self::new)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OptionsStore for YamlOptionsFile {
    fn load(&self) -> Result<Options> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read {}", self.path.display()))?;
        let mut options: Options = serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", self.path.display()))?;

        // A relative `dir` is relative to the options file, not the caller's cwd.
        if options.dir.is_relative() {
            if let Some(parent) = self.path.parent() {
                options.dir = parent.join(&options.dir);
            }
        }
        tracing::debug!(
            path = %self.path.display(),
            dir = %options.dir.display(),
            "loaded options"
        );
        Ok(options)
    }
}
