use anyhow::{Context, Result};
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Exclusive lock over one destination directory.
///
/// Held while sibling names are read, suffixes allocated and files written,
/// so concurrent runs never pick the same name. Released on drop.
pub struct DirectoryLock {
    file: File,
    path: PathBuf,
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl DirectoryLock {
    /// Block until the lock for `dir` is held
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = lock_path_for_dir(dir);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("open directory lock {}", path.display()))?;

        let start = Instant::now();
        file.lock_exclusive()
            .with_context(|| format!("acquire directory lock {}", path.display()))?;
        log::debug!(
            "Locked {} after {} ms",
            dir.display(),
            start.elapsed().as_millis()
        );

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lock file in the system temp dir, named after the canonical directory
pub fn lock_path_for_dir(dir: &Path) -> PathBuf {
    let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    let digest = Sha256::digest(canonical.to_string_lossy().as_bytes());
    let name = format!("class-splitter-{:x}.lock", digest);
    std::env::temp_dir().join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_path_is_stable_per_directory() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        assert_eq!(lock_path_for_dir(a.path()), lock_path_for_dir(a.path()));
        assert_ne!(lock_path_for_dir(a.path()), lock_path_for_dir(b.path()));
        assert!(lock_path_for_dir(a.path()).starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_lock_is_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let first = DirectoryLock::acquire(dir.path()).unwrap();
        let path = first.path().to_path_buf();
        drop(first);

        let probe = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        assert!(probe.try_lock_exclusive().is_ok());
        probe.unlock().unwrap();
    }
}
