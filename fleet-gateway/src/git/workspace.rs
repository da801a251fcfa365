use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory name prefix of request workspaces.
const WORKSPACE_PREFIX: &str = "fleet-workspace";

/// An exclusively owned scratch directory for one repository operation.
///
/// The directory name carries a fresh UUID so concurrent invocations can
/// never collide, and the directory is created with owner-only permissions.
/// Removal happens recursively on drop, which covers every exit path of the
/// operation that acquired it — early returns, error branches and panics
/// alike. Handles are never reused.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    /// Acquires a workspace under the system temp directory.
    pub fn acquire() -> io::Result<Self> {
        Self::acquire_in(std::env::temp_dir())
    }

    /// Acquires a workspace under an explicit parent directory.
    pub fn acquire_in(parent: impl AsRef<Path>) -> io::Result<Self> {
        let path = parent
            .as_ref()
            .join(format!("{WORKSPACE_PREFIX}-{}", Uuid::new_v4()));

        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(&path)?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        // Removal failures are not actionable here; the next invocation uses
        // a fresh directory either way.
        if let Err(err) = fs::remove_dir_all(&self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "failed to remove workspace"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_creates_a_unique_directory() {
        let parent = tempfile::tempdir().unwrap();
        let first = Workspace::acquire_in(parent.path()).unwrap();
        let second = Workspace::acquire_in(parent.path()).unwrap();

        assert!(first.path().is_dir());
        assert!(second.path().is_dir());
        assert_ne!(first.path(), second.path());
    }

    #[test]
    fn drop_removes_the_directory() {
        let parent = tempfile::tempdir().unwrap();
        let path = {
            let workspace = Workspace::acquire_in(parent.path()).unwrap();
            fs::write(workspace.path().join("web.yaml"), "name: web\n").unwrap();
            workspace.path().to_owned()
        };

        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn directory_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let parent = tempfile::tempdir().unwrap();
        let workspace = Workspace::acquire_in(parent.path()).unwrap();
        let mode = fs::metadata(workspace.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
