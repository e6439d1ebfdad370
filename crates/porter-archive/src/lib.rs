//! Archive engine abstraction for the porter task layer.
//!
//! Tasks talk to archives only through [`ArchiveEngine`]; the bundled
//! [`DefaultEngine`] handles the common zip/tar formats. Deployments
//! with external tooling (WinRAR, unar) plug in their own engine
//! implementation instead.

mod default_engine;

use std::path::{Path, PathBuf};

use porter_core::OpsError;

pub use default_engine::DefaultEngine;

/// Options for a compress call.
#[derive(Debug, Clone, Default)]
pub struct CompressOption {
    pub password: Option<String>,
}

/// Options for an extract call.
#[derive(Debug, Clone, Default)]
pub struct ExtractOption {
    pub password: Option<String>,
}

/// A pluggable archive backend. Calls are blocking; the task layer runs
/// them inside `spawn_blocking`.
pub trait ArchiveEngine: Send + Sync {
    /// Pack `sources` into the archive at `output`, inferring the
    /// format from the output extension.
    fn compress(
        &self,
        sources: &[PathBuf],
        output: &Path,
        option: &CompressOption,
    ) -> Result<(), OpsError>;

    /// Unpack the archive at `input` into the directory `output`.
    fn extract(&self, input: &Path, output: &Path, option: &ExtractOption)
    -> Result<(), OpsError>;

    /// Whether this engine can create archives.
    fn can_compress(&self) -> bool {
        true
    }

    /// Whether this engine can unpack archives.
    fn can_extract(&self) -> bool {
        true
    }
}
