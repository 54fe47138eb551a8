use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::shared::constants::{DEFAULT_MASK_EXTENSION, MASK_FILE_PREFIX};

/// Where mask artifacts are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MaskLocation {
    /// One well-known file shared by every request.
    ///
    /// Concurrent requests overwrite each other's mask while the inpainter
    /// may still be reading it. Only safe for strictly sequential use.
    Fixed(PathBuf),
    /// A fresh, uniquely named file inside `dir` for every request.
    PerRequest { dir: PathBuf, extension: String },
}

impl MaskLocation {
    pub fn per_request_in(dir: impl Into<PathBuf>) -> Self {
        MaskLocation::PerRequest {
            dir: dir.into(),
            extension: DEFAULT_MASK_EXTENSION.to_string(),
        }
    }

    /// Replaces the container extension used for per-request files.
    pub fn with_extension(self, extension: &str) -> Self {
        match self {
            MaskLocation::PerRequest { dir, .. } => MaskLocation::PerRequest {
                dir,
                extension: extension.trim_start_matches('.').to_string(),
            },
            fixed => fixed,
        }
    }

    /// Directory or file this location points at, for diagnostics.
    pub fn describe(&self) -> &Path {
        match self {
            MaskLocation::Fixed(path) => path,
            MaskLocation::PerRequest { dir, .. } => dir,
        }
    }

    /// Reserves the path for one request.
    ///
    /// Per-request files are created empty and removed again when the
    /// returned target is dropped, unless it is kept.
    pub fn allocate(&self) -> io::Result<MaskTarget> {
        match self {
            MaskLocation::Fixed(path) => Ok(MaskTarget {
                path: path.clone(),
                temp: None,
            }),
            MaskLocation::PerRequest { dir, extension } => {
                fs::create_dir_all(dir)?;
                let temp = tempfile::Builder::new()
                    .prefix(MASK_FILE_PREFIX)
                    .suffix(&format!(".{extension}"))
                    .tempfile_in(dir)?
                    .into_temp_path();
                Ok(MaskTarget {
                    path: temp.to_path_buf(),
                    temp: Some(temp),
                })
            }
        }
    }
}

impl Default for MaskLocation {
    fn default() -> Self {
        Self::per_request_in(std::env::temp_dir())
    }
}

/// A reserved mask path, owned by exactly one request.
#[derive(Debug)]
pub struct MaskTarget {
    path: PathBuf,
    temp: Option<tempfile::TempPath>,
}

impl MaskTarget {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the file is removed on drop.
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Stops automatic removal and returns the path.
    pub fn keep(mut self) -> io::Result<PathBuf> {
        if let Some(temp) = self.temp.take() {
            temp.keep().map_err(|e| e.error)?;
        }
        Ok(self.path)
    }

    /// Deletes whatever was written to the path.
    pub fn discard(self) {
        match self.temp {
            Some(temp) => {
                if let Err(e) = temp.close() {
                    log::warn!("Failed to remove mask {}: {e}", self.path.display());
                }
            }
            None => {
                if let Err(e) = fs::remove_file(&self.path) {
                    if e.kind() != io::ErrorKind::NotFound {
                        log::warn!("Failed to remove mask {}: {e}", self.path.display());
                    }
                }
            }
        }
    }
}
