//! Process-wide exclusive locks, one per backing file.
//!
//! Every handle opened on the same file shares a single mutex, so two
//! independent `open` calls still serialize their read-modify-write cycles.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, Weak};

/// Shared lock for one file. Guards no data itself; the file is the data.
pub type FileLock = Arc<Mutex<()>>;

static REGISTRY: OnceLock<Mutex<HashMap<PathBuf, Weak<Mutex<()>>>>> = OnceLock::new();

/// Return the lock for `path`, creating it if no live handle holds one.
///
/// `path` should already be canonical; differently spelled paths to the same
/// file would otherwise get distinct locks.
pub fn for_path(path: &Path) -> FileLock {
    let mut registry = REGISTRY.get_or_init(Default::default).lock();

    if let Some(lock) = registry.get(path).and_then(Weak::upgrade) {
        return lock;
    }

    // Drop entries whose stores have all gone away.
    registry.retain(|_, weak| weak.strong_count() > 0);

    let lock = Arc::new(Mutex::new(()));
    registry.insert(path.to_path_buf(), Arc::downgrade(&lock));
    lock
}
