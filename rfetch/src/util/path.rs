//! Path confinement
// (c) 2026 The rfetch developers

use std::path::{Component, Path, PathBuf};

use anyhow::Context as _;

/// Reasons a requested path cannot be placed under a root directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path tried to climb out with `..`
    #[error("path must not contain `..`")]
    ParentComponent,
    /// After normalisation nothing was left, so the path names the root itself
    #[error("path does not name a file")]
    Empty,
}

/// Resolves a path, as sent by a peer or typed by a user, under a root directory.
///
/// * A leading `/` is ignored: `/a/b.txt` means `<root>/a/b.txt`.
/// * `.` components and repeated separators are ignored.
/// * Any `..` component is rejected outright, wherever it appears.
///
/// This is a purely lexical operation; the filesystem is not consulted.
pub(crate) fn resolve_under_root(root: &Path, requested: &str) -> Result<PathBuf, PathError> {
    let mut relative = PathBuf::new();
    for component in Path::new(requested).components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => (),
            Component::ParentDir => return Err(PathError::ParentComponent),
            Component::Normal(part) => relative.push(part),
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(PathError::Empty);
    }
    Ok(root.join(relative))
}

/// Checks that `path` is an existing directory, returning its canonical form.
///
/// `what` describes the directory in error messages (e.g. "server root").
pub(crate) fn require_directory(path: &Path, what: &str) -> anyhow::Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("{what} {} is not accessible", path.display()))?;
    anyhow::ensure!(
        canonical.is_dir(),
        "{what} {} is not a directory",
        path.display()
    );
    Ok(canonical)
}
