//! Scoped temporary storage for uploads.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempPath;
use tracing::{debug, warn};

use crate::traits::FileStager;
use crate::types::UploadedFile;

type ReleaseHook = Box<dyn FnOnce(&Path) + Send + Sync>;

/// A staged upload. The backing file is removed on [`release`](Self::release)
/// or on drop, whichever comes first.
pub struct StagedFile {
    path: PathBuf,
    temp: Option<TempPath>,
    hook: Option<ReleaseHook>,
    released: bool,
}

impl StagedFile {
    /// Own a temp file created by `tempfile`.
    pub fn from_temp(temp: TempPath) -> Self {
        Self {
            path: temp.to_path_buf(),
            temp: Some(temp),
            hook: None,
            released: false,
        }
    }

    /// A location someone else cleans up. Only the release hook, if any, runs on release.
    pub fn external(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temp: None,
            hook: None,
            released: false,
        }
    }

    /// Run `hook` once, after the file is released.
    pub fn with_release_hook(mut self, hook: impl FnOnce(&Path) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Delete the backing file if this guard owns it, then run the hook.
    /// Safe to call more than once.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(temp) = self.temp.take() {
            if let Err(e) = temp.close() {
                warn!(path = %self.path.display(), error = %e, "Failed to remove staged file");
            }
        }
        if let Some(hook) = self.hook.take() {
            hook(&self.path);
        }
        debug!(path = %self.path.display(), "Staged file released");
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedFile")
            .field("path", &self.path)
            .field("released", &self.released)
            .finish()
    }
}

/// Stages uploads in the system temp directory, keeping the extension so
/// the remote service can sniff the format.
#[derive(Debug, Clone)]
pub struct TempFileStager {
    prefix: String,
    dir: Option<PathBuf>,
}

impl Default for TempFileStager {
    fn default() -> Self {
        Self {
            prefix: "procure-upload-".to_string(),
            dir: None,
        }
    }
}

impl TempFileStager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage into `dir` instead of the system temp directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl FileStager for TempFileStager {
    async fn stage(&self, file: &UploadedFile) -> std::io::Result<StagedFile> {
        let prefix = self.prefix.clone();
        let suffix = file.extension().unwrap_or_default();
        let dir = self.dir.clone();
        let bytes = file.bytes.clone();

        let temp = tokio::task::spawn_blocking(move || -> std::io::Result<TempPath> {
            let mut builder = tempfile::Builder::new();
            builder.prefix(&prefix).suffix(&suffix);
            let mut named = match dir {
                Some(dir) => builder.tempfile_in(dir)?,
                None => builder.tempfile()?,
            };
            named.write_all(&bytes)?;
            named.flush()?;
            Ok(named.into_temp_path())
        })
        .await
        .map_err(std::io::Error::other)??;

        debug!(path = %temp.display(), bytes = file.bytes.len(), "Upload staged");
        Ok(StagedFile::from_temp(temp))
    }
}
