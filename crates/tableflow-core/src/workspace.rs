use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

/// Ephemeral local directory tree scoped to a single stage invocation.
/// Dropping the workspace removes everything under it, on success and
/// failure alike. Never shared across concurrent invocations.
pub struct ScratchWorkspace {
    dir: TempDir,
}

impl ScratchWorkspace {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create (if needed) and return the named subdirectory.
    pub fn subdir(&self, name: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::create_dir_all(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::ScratchWorkspace;

    #[test]
    fn removed_on_drop() {
        let workspace = ScratchWorkspace::new().unwrap();
        let subdir = workspace.subdir("snapshot").unwrap();
        std::fs::write(subdir.join("file"), b"x").unwrap();
        let root = workspace.path().to_path_buf();
        assert!(root.exists());

        drop(workspace);
        assert!(!root.exists());
    }

    #[test]
    fn workspaces_never_collide() {
        let a = ScratchWorkspace::new().unwrap();
        let b = ScratchWorkspace::new().unwrap();
        assert_ne!(a.path(), b.path());
    }
}
