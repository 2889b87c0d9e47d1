//! Disk I/O helpers: bootstrap, load, and atomic write.
//!
//! The rename-over approach is atomic on POSIX filesystems. On FAT32 or
//! network shares there are no hard guarantees.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::serializer::Serializer;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Create an empty file at `path` if nothing is there yet. Never truncates
/// an existing file, so concurrent callers can race on it safely.
pub fn ensure_file(path: &Path) -> Result<()> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => {
            tracing::debug!(path = %path.display(), "created empty store file");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(Error::Io(format!("{}: {e}", path.display()))),
    }
}

/// Reads and deserializes the file at `path`. A missing file, or one that is
/// empty or whitespace only, is an empty document rather than an error.
pub fn load<S: Serializer>(path: &Path, serializer: &S) -> Result<Document> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::default()),
        Err(e) => return Err(Error::Io(format!("{}: {e}", path.display()))),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::default());
    }
    let doc: Document = serializer.deserialize(&bytes)?;
    tracing::trace!(
        path = %path.display(),
        bytes = bytes.len(),
        posts = doc.posts.len(),
        users = doc.users.len(),
        refresh_tokens = doc.refresh_tokens.len(),
        "loaded document"
    );
    Ok(doc)
}

/// Serialize `doc` and atomically replace the file at `path` with it.
pub fn save<S: Serializer>(path: &Path, doc: &Document, serializer: &S) -> Result<()> {
    let bytes = serializer.serialize(doc)?;
    atomic_write(path, &bytes)?;
    tracing::trace!(path = %path.display(), bytes = bytes.len(), "saved document");
    Ok(())
}

/// Path of the scratch file used by [`atomic_write`].
pub fn temp_path(path: &Path) -> PathBuf {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
    path.with_extension(format!("{ext}.tmp"))
}

/// Write `bytes` to `<path>.tmp`, sync it, rename over `path`, then sync the
/// parent directory so the rename itself is on disk when this returns. A
/// crash or failed write leaves the previous contents of `path` untouched.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = temp_path(path);
    let io_err = |e: std::io::Error| Error::Io(format!("{}: {e}", tmp.display()));

    let mut file = File::create(&tmp).map_err(io_err)?;
    let written = file.write_all(bytes).and_then(|()| file.sync_all());
    drop(file);
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(e));
    }

    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        Error::Io(format!("{}: {e}", path.display()))
    })?;
    sync_parent_dir(path)
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| Error::Io(format!("{}: {e}", dir.display())))
}

// Directory handles can't be synced here; the rename is as durable as the
// filesystem makes it.
#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}
