//! Run configuration loaded from `.kl-ctags.toml`.
//!
//! Format:
//! ```toml
//! search_paths = ["/opt/fabric/Exts", "~/kl/exts"]
//! builtin_manifest = "/opt/fabric/Exts/kl.symbols.yaml"
//! encoding = "utf-8"
//! distinguish_structs = false
//! cache_lines = true
//! include_internal = true
//! builtin_output = "kl.builtin.ctags"
//! custom_output = "kl.user.ctags"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TagsError};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILENAME: &str = ".kl-ctags.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagsConfig {
    /// Ordered roots scanned in custom mode
    pub search_paths: Vec<PathBuf>,

    /// Manifest describing the builtin extensions
    pub builtin_manifest: Option<PathBuf>,

    /// Value written to `!_TAG_FILE_ENCODING`
    pub encoding: String,

    /// Report `struct:` instead of `class:` for members of struct types.
    /// Off by default, which keeps the historical `object`/`class` output.
    pub distinguish_structs: bool,

    /// Read each source file once per run instead of once per symbol
    pub cache_lines: bool,

    /// Include internal free functions and operators
    pub include_internal: bool,

    pub builtin_output: PathBuf,
    pub custom_output: PathBuf,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            builtin_manifest: None,
            encoding: "utf-8".to_string(),
            distinguish_structs: false,
            cache_lines: true,
            include_internal: true,
            builtin_output: PathBuf::from("kl.builtin.ctags"),
            custom_output: PathBuf::from("kl.user.ctags"),
        }
    }
}

impl TagsConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e: toml::de::Error| TagsError::Config(format!("Invalid config: {}", e)))
    }

    /// Loads the config at `path`, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}
