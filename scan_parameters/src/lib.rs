// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

//! Analysis parameters shared by the haplotype block and phylogeny passes.
//!
//! Defaults are compiled in.  A `parameters.toml` may override any subset of
//! them; every value that differs from its default is logged with `warn!` so
//! that runs with tuned parameters are visible in the log.

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up next to the running executable when no explicit
/// parameters file is given.
pub const PARAMETERS_FILE_NAME: &str = "parameters.toml";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScanParameters {
    /// The tracker only reports blocks spanning at least this many columns.
    pub min_column_span: usize,
    /// The tracker only reports blocks whose strain group has at least
    /// this many strains.
    pub min_group_size: usize,
    /// Internal phylogeny edges no longer than this are collapsed.  Zero
    /// collapses only the zero-length edges.
    pub collapse_edge_threshold: f64,
    /// Splice out internal phylogeny nodes with a single child.
    pub remove_nonbranching_nodes: bool,
}

pub const DEFAULT_PARAMETERS: ScanParameters = ScanParameters {
    min_column_span: 1,
    min_group_size: 2,
    collapse_edge_threshold: 0.0,
    remove_nonbranching_nodes: true,
};

impl Default for ScanParameters {
    fn default() -> Self {
        DEFAULT_PARAMETERS
    }
}

macro_rules! warn_if_changed {
    ($p:expr, $($a:ident),+) => {
        $(
            if DEFAULT_PARAMETERS.$a != $p.$a {
                warn!("using non-default {} = {:?}", stringify!($a), $p.$a);
            }
        )+
    };
}

impl ScanParameters {
    /// Parse parameters from TOML text.  Missing keys keep their defaults.
    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read parameters from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
        let params = Self::from_toml(&s).with_context(|| path.display().to_string())?;
        params.warn_non_default();
        Ok(params)
    }

    /// Read parameters from `path` if given, otherwise from
    /// `parameters.toml` next to the running executable.  A missing file
    /// falls back to the defaults; a malformed one is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_path()?,
        };
        if !path.exists() {
            warn!(
                "could not find {} at {}, falling back to defaults",
                PARAMETERS_FILE_NAME,
                path.display()
            );
            return Ok(DEFAULT_PARAMETERS);
        }
        Self::load(&path)
    }

    /// Log every value that differs from the compiled-in default.
    pub fn warn_non_default(&self) {
        warn_if_changed!(
            self,
            min_column_span,
            min_group_size,
            collapse_edge_threshold,
            remove_nonbranching_nodes
        );
    }
}

fn default_path() -> Result<PathBuf> {
    Ok(std::env::current_exe()
        .context("Unable to locate the running executable")?
        .with_file_name(PARAMETERS_FILE_NAME))
}
