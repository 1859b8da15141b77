//! Filesystem helpers shared across modules.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::{Error, Result};

/// Ensure a directory exists, creating it (recursively) if needed.
pub async fn ensure_dir_all(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| Error::io_path("creating directory", path, e))
}

/// Best-effort removal of pipeline artifacts.
///
/// Missing files are expected (a failed download may never have created its
/// target) and only logged at debug level; any other failure is logged as a
/// warning. Never fails.
pub async fn remove_artifacts<P: AsRef<Path>>(paths: &[P]) {
    for path in paths {
        let path = path.as_ref();
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Removed artifact"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Artifact already absent")
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove artifact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_remove_artifacts_tolerates_missing_files() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("present.fb2");
        let missing = dir.path().join("missing.mobi");
        tokio::fs::write(&present, b"data").await.unwrap();

        remove_artifacts(&[&present, &missing]).await;

        assert!(!present.exists());
        assert!(!missing.exists());
    }

    #[tokio::test]
    async fn test_ensure_dir_all_nested() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir_all(&nested).await.unwrap();
        assert!(nested.is_dir());
        ensure_dir_all(&nested).await.unwrap();
    }
}
