//! Layered configuration
//!
//! Precedence, lowest first: built-in defaults, `bm25-enrich.toml` (found in
//! the input directory, or given explicitly), `BM25_ENRICH_*` environment
//! variables, then CLI flags via [`merge_cli_with_config`].

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::path::{Path, PathBuf};

use crate::domain::Config;
use crate::error::{Error, Result};

pub mod merge;

pub use merge::{merge_cli_with_config, CliOverrides};

pub const CONFIG_FILE_NAME: &str = "bm25-enrich.toml";
pub const ENV_PREFIX: &str = "BM25_ENRICH_";

/// `bm25-enrich.toml` inside `input_dir`, if present.
pub fn discover_config_file(input_dir: &Path) -> Option<PathBuf> {
    let candidate = input_dir.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

/// Resolves defaults, the config file and the environment into a [`Config`].
///
/// An explicit `config_file` must exist; otherwise the file is looked up in
/// `input_dir` and silently skipped when absent.
pub fn load_config(config_file: Option<&Path>, input_dir: Option<&Path>) -> Result<Config> {
    let file = match config_file {
        Some(path) if !path.is_file() => {
            return Err(Error::Config(format!("config file not found: {}", path.display())));
        }
        Some(path) => Some(path.to_path_buf()),
        None => input_dir.and_then(discover_config_file),
    };

    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = &file {
        tracing::debug!(path = %path.display(), "loading config file");
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(Env::prefixed(ENV_PREFIX));

    figment.extract::<Config>().map_err(|err| Error::Config(err.to_string()))
}
