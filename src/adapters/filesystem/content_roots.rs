//! `ContentFingerprints` implementation over the physical content directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use tracing::warn;

use super::{Confinement, confine};
use crate::domain::AppError;
use crate::ports::ContentFingerprints;

/// The content directories a node may fetch files from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    Scripts,
    Skels,
    Certs,
}

impl ContentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::Scripts => "scripts",
            ContentCategory::Skels => "skels",
            ContentCategory::Certs => "certs",
        }
    }
}

/// Read-only roots for scripts, skeleton files, and per-domain certificates.
#[derive(Debug, Clone)]
pub struct ContentRoots {
    scripts: PathBuf,
    skels: PathBuf,
    certs: PathBuf,
}

impl ContentRoots {
    pub fn new(scripts: PathBuf, skels: PathBuf, certs: PathBuf) -> Self {
        Self { scripts, skels, certs }
    }

    pub fn root(&self, category: ContentCategory) -> &Path {
        match category {
            ContentCategory::Scripts => &self.scripts,
            ContentCategory::Skels => &self.skels,
            ContentCategory::Certs => &self.certs,
        }
    }

    /// Resolve a file under a content root.
    ///
    /// Missing files and paths escaping the root are both reported as
    /// `NotFound`; the escape is only visible in the logs.
    pub fn locate(
        &self,
        category: ContentCategory,
        relative: impl AsRef<Path>,
    ) -> Result<PathBuf, AppError> {
        let relative = relative.as_ref();
        let not_found = || {
            AppError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} file not found: {}", category.as_str(), relative.display()),
            ))
        };

        let root = self.root(category).canonicalize().map_err(|_| not_found())?;
        match confine(&root, relative) {
            Ok(path) if path.is_file() => Ok(path),
            Ok(_) | Err(Confinement::Missing) => Err(not_found()),
            Err(Confinement::Escaped(resolved)) => {
                warn!(
                    "Rejected {} lookup escaping its root: {} -> {}",
                    category.as_str(),
                    relative.display(),
                    resolved.display()
                );
                Err(not_found())
            }
        }
    }

    fn fingerprint(&self, category: ContentCategory, relative: &Path) -> Option<String> {
        let path = self.locate(category, relative).ok()?;
        fingerprint_file(&path)
    }
}

impl ContentFingerprints for ContentRoots {
    fn script(&self, name: &str) -> Option<String> {
        self.fingerprint(ContentCategory::Scripts, Path::new(name))
    }

    fn skeleton(&self, name: &str) -> Option<String> {
        self.fingerprint(ContentCategory::Skels, Path::new(name))
    }

    fn certificate(&self, domain: &str, file_name: &str) -> Option<String> {
        self.fingerprint(ContentCategory::Certs, &Path::new(domain).join(file_name))
    }
}

/// Hex-encoded MD5 of a file's bytes, or `None` when it cannot be read.
pub fn fingerprint_file(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => Some(hash_bytes(&bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            warn!("Cannot fingerprint {}: {}", path.display(), err);
            None
        }
    }
}

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}
