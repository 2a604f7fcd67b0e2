//! Media storage rooted at a single directory.
//!
//! Records refer to files by paths relative to the root (e.g. `images/cat.png`),
//! so the whole tree can be moved without touching the database.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RecordError, Result};

/// Directory uploads are copied into
pub const UPLOAD_DIR: &str = "images";

/// Directory generated thumbnails are written to
pub const THUMBNAIL_DIR: &str = "thumbnails";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRoot {
    root: PathBuf,
}

impl MediaRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a stored reference
    pub fn path(&self, reference: &str) -> PathBuf {
        self.root.join(reference)
    }

    pub fn exists(&self, reference: &str) -> bool {
        self.path(reference).is_file()
    }

    /// Create a directory under the root if it is missing.
    ///
    /// An already existing directory is not an error, even when another
    /// writer created it between the check and the call.
    pub fn ensure_dir(&self, dir: &str) -> Result<PathBuf> {
        let path = self.root.join(dir);
        fs::create_dir_all(&path).map_err(|e| RecordError::storage(&path, e))?;
        Ok(path)
    }

    /// Write bytes to `reference`, replacing any previous content
    pub fn write(&self, reference: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(reference);
        fs::write(&path, bytes).map_err(|e| RecordError::storage(&path, e))
    }

    /// Remove a stored file. A missing file is not an error.
    pub fn remove(&self, reference: &str) -> Result<()> {
        let path = self.path(reference);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RecordError::storage(&path, e)),
        }
    }

    /// Copy an uploaded file into the upload directory.
    ///
    /// Returns the reference of the stored copy. When the file name is already
    /// taken, `_1`, `_2`, ... is appended to the stem.
    pub fn store_upload(&self, source: &Path) -> Result<String> {
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| {
                RecordError::Validation(format!("{} has no file name", source.display()))
            })?;

        self.ensure_dir(UPLOAD_DIR)?;
        let reference = self.available_reference(UPLOAD_DIR, &file_name);
        let destination = self.path(&reference);

        fs::copy(source, &destination).map_err(|e| RecordError::storage(source, e))?;
        Ok(reference)
    }

    /// First reference under `dir` that does not name an existing file
    fn available_reference(&self, dir: &str, file_name: &str) -> String {
        let candidate = format!("{}/{}", dir, file_name);
        if !self.path(&candidate).exists() {
            return candidate;
        }

        let (stem, ext) = split_name(file_name);
        let mut counter = 1;
        loop {
            let candidate = format!("{}/{}_{}{}", dir, stem, counter, ext);
            if !self.path(&candidate).exists() {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Split a file name into its stem and extension, the extension keeping its dot.
///
/// `"cat.png"` gives `("cat", ".png")`, `"archive.tar.gz"` gives
/// `("archive.tar", ".gz")` and `".hidden"` gives `(".hidden", "")`.
pub fn split_name(file_name: &str) -> (String, String) {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, ext)
}
