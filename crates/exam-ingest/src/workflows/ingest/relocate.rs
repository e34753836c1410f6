use filetime::FileTime;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What happened when a script was filed into the output folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    Created,
    Replaced,
    AlreadyExists,
}

impl MoveStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MoveStatus::Created => "File created",
            MoveStatus::Replaced => "File replaced",
            MoveStatus::AlreadyExists => "File already exists",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelocationError {
    #[error("source {path} is missing or unreadable: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("source {path} is not a regular file")]
    NotAFile { path: PathBuf },
    #[error("could not inspect destination {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not write {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not remove {path} after filing it: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Filesystem operations the selection engine's plans are executed against.
pub trait FileStore {
    fn exists(&self, path: &Path) -> bool;
    /// Remove a file; a file that is already gone counts as removed.
    fn remove(&self, path: &Path) -> io::Result<()>;
    fn relocate(&self, from: &Path, to: &Path) -> Result<MoveStatus, RelocationError>;
}

/// [`FileStore`] backed by the local disk. Assumes it is the only writer.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileStore;

impl FileStore for LocalFileStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn relocate(&self, from: &Path, to: &Path) -> Result<MoveStatus, RelocationError> {
        move_into(from, to)
    }
}

/// Move `src` to `dst` unless `dst` is already at least as new as `src`.
///
/// `src` is only removed after `dst` holds its contents (or is already current), so an
/// interrupted run leaves the source in place for the next attempt.
pub fn move_into(src: &Path, dst: &Path) -> Result<MoveStatus, RelocationError> {
    let source_meta = fs::metadata(src).map_err(|source| RelocationError::Source {
        path: src.to_path_buf(),
        source,
    })?;
    if !source_meta.is_file() {
        return Err(RelocationError::NotAFile {
            path: src.to_path_buf(),
        });
    }
    let source_mtime = FileTime::from_last_modification_time(&source_meta);

    let status = match fs::metadata(dst) {
        Ok(existing) => {
            if FileTime::from_last_modification_time(&existing) >= source_mtime {
                debug!(from = %src.display(), to = %dst.display(), "destination is current");
                remove_source(src)?;
                return Ok(MoveStatus::AlreadyExists);
            }
            copy_contents(src, dst)?;
            MoveStatus::Replaced
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            if fs::hard_link(src, dst).is_err() {
                copy_contents(src, dst)?;
            }
            MoveStatus::Created
        }
        Err(source) => {
            return Err(RelocationError::Destination {
                path: dst.to_path_buf(),
                source,
            });
        }
    };

    filetime::set_file_mtime(dst, FileTime::now()).map_err(|source| RelocationError::Copy {
        path: dst.to_path_buf(),
        source,
    })?;
    remove_source(src)?;

    Ok(status)
}

fn copy_contents(src: &Path, dst: &Path) -> Result<(), RelocationError> {
    fs::copy(src, dst)
        .map(|_| ())
        .map_err(|source| RelocationError::Copy {
            path: dst.to_path_buf(),
            source,
        })
}

fn remove_source(src: &Path) -> Result<(), RelocationError> {
    LocalFileStore
        .remove(src)
        .map_err(|source| RelocationError::Cleanup {
            path: src.to_path_buf(),
            source,
        })
}
