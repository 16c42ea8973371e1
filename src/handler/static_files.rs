//! Static file serving module
//!
//! Resolves request paths against the static root and holds the SPA entry
//! document used for client-side routes.

use crate::logger;
use hyper::body::Bytes;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Directory holding the compiled application, canonicalized once at startup
#[derive(Debug, Clone)]
pub struct StaticRoot {
    root: PathBuf,
}

impl StaticRoot {
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        let root = dir.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Map a request path to a regular file under the root
    ///
    /// `/` maps to `index.html`. Returns the canonical path that passed the
    /// containment check, or `None` when nothing servable exists, including
    /// directories and any path that would leave the root.
    pub async fn resolve(&self, pathname: &str) -> Option<PathBuf> {
        let relative = if pathname == "/" {
            "index.html"
        } else {
            pathname.trim_start_matches('/')
        };

        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            logger::log_warning(&format!("Path traversal attempt blocked: {pathname}"));
            return None;
        }

        let candidate = self.root.join(relative);

        // File not found is common, no need to log
        let canonical = fs::canonicalize(&candidate).await.ok()?;
        if !canonical.starts_with(&self.root) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {}",
                pathname,
                canonical.display()
            ));
            return None;
        }

        let metadata = fs::metadata(&canonical).await.ok()?;
        metadata.is_file().then_some(canonical)
    }
}

/// Entry document served for client-side routes
///
/// Read once at startup and never reloaded.
#[derive(Debug, Clone)]
pub struct FallbackDocument {
    body: Bytes,
}

impl FallbackDocument {
    pub async fn load(path: &Path) -> io::Result<Self> {
        let body = fs::read(path).await?;
        Ok(Self::from_bytes(body))
    }

    pub fn from_bytes(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }

    /// Cheap handle to the document bytes
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }
}
