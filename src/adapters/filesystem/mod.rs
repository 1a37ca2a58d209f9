//! Filesystem adapters: confined path resolution and content fingerprinting.
//!
//! Every lookup goes through [`confine`], which resolves symbolic links before
//! checking containment, so neither `..` segments nor links can leave a root.

mod content_roots;

pub use content_roots::{ContentCategory, ContentRoots, fingerprint_file};

use std::path::{Path, PathBuf};

/// Why a candidate path could not be confined to its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Confinement {
    /// The candidate (or the root) does not exist.
    Missing,
    /// The candidate exists but resolves outside the root.
    Escaped(PathBuf),
}

/// Resolve `relative` under `root` and require the result to stay inside it.
///
/// `root` must already be canonical. Returns the fully resolved path.
pub(crate) fn confine(root: &Path, relative: &Path) -> Result<PathBuf, Confinement> {
    let resolved = root.join(relative).canonicalize().map_err(|_| Confinement::Missing)?;
    if !resolved.starts_with(root) {
        return Err(Confinement::Escaped(resolved));
    }
    Ok(resolved)
}
