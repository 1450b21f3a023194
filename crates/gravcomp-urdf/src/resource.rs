//! Resolution of resource URIs referenced by a robot description.
//!
//! Descriptions name meshes as `package://<package>/<path>`, `file://<path>`
//! or plain paths. A [`ResourceRetriever`] maps them onto local files.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::UrdfError;

/// Environment variables searched for package roots, in priority order.
pub const PACKAGE_PATH_VARS: [&str; 2] = ["GRAVCOMP_PACKAGE_PATH", "ROS_PACKAGE_PATH"];

const PACKAGE_SCHEME: &str = "package://";
const FILE_SCHEME: &str = "file://";

// ---------------------------------------------------------------------------
// ResourceRetriever
// ---------------------------------------------------------------------------

/// Maps resource URIs onto local files.
pub trait ResourceRetriever: Send + Sync {
    /// Resolve `uri` to an existing local path.
    fn resolve(&self, uri: &str) -> Result<PathBuf, UrdfError>;

    /// Whether `uri` resolves.
    fn exists(&self, uri: &str) -> bool {
        self.resolve(uri).is_ok()
    }

    /// Read the resource's bytes.
    fn retrieve(&self, uri: &str) -> Result<Vec<u8>, UrdfError> {
        let path = self.resolve(uri)?;
        std::fs::read(&path).map_err(|source| UrdfError::Io { path, source })
    }
}

// ---------------------------------------------------------------------------
// LocalResourceRetriever
// ---------------------------------------------------------------------------

/// Resolves `file://` URIs and plain paths. Relative paths are joined onto an
/// optional base directory.
#[derive(Debug, Clone, Default)]
pub struct LocalResourceRetriever {
    base_dir: Option<PathBuf>,
}

impl LocalResourceRetriever {
    /// Resolve relative paths against the working directory.
    pub const fn new() -> Self {
        Self { base_dir: None }
    }

    /// Resolve relative paths against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }
}

impl ResourceRetriever for LocalResourceRetriever {
    fn resolve(&self, uri: &str) -> Result<PathBuf, UrdfError> {
        let raw = uri.strip_prefix(FILE_SCHEME).unwrap_or(uri);
        if raw.contains("://") {
            return Err(UrdfError::UnresolvedResource {
                uri: uri.into(),
                reason: "unsupported URI scheme".into(),
            });
        }
        let path = Path::new(raw);
        let path = match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        };
        if path.exists() {
            Ok(path)
        } else {
            Err(UrdfError::UnresolvedResource {
                uri: uri.into(),
                reason: format!("{} does not exist", path.display()),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// PackageResourceRetriever
// ---------------------------------------------------------------------------

/// Resolves `package://` URIs against a list of package search roots and
/// falls back to [`LocalResourceRetriever`] for everything else.
///
/// A root may either contain packages as subdirectories (`<root>/<pkg>`) or be
/// a package directory itself (its final component equals `<pkg>`).
#[derive(Debug, Clone, Default)]
pub struct PackageResourceRetriever {
    roots: Vec<PathBuf>,
    local: LocalResourceRetriever,
}

impl PackageResourceRetriever {
    /// Search the given roots in order.
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            local: LocalResourceRetriever::new(),
        }
    }

    /// Build the root list from [`PACKAGE_PATH_VARS`]. Missing variables
    /// yield an empty root list.
    pub fn from_env() -> Self {
        let roots = PACKAGE_PATH_VARS
            .iter()
            .filter_map(env::var_os)
            .flat_map(|value| env::split_paths(&value).collect::<Vec<_>>())
            .filter(|p| !p.as_os_str().is_empty())
            .collect::<Vec<_>>();
        Self::new(roots)
    }

    /// Builder: resolve non-package relative paths against `base_dir`.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.local = LocalResourceRetriever::with_base_dir(base_dir);
        self
    }

    /// Package search roots in priority order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn resolve_package(&self, uri: &str, rest: &str) -> Result<PathBuf, UrdfError> {
        let (package, relative) = rest.split_once('/').unwrap_or((rest, ""));
        if package.is_empty() {
            return Err(UrdfError::UnresolvedResource {
                uri: uri.into(),
                reason: "empty package name".into(),
            });
        }
        for root in &self.roots {
            let package_dir = if root.file_name().is_some_and(|name| name == package) {
                root.clone()
            } else {
                root.join(package)
            };
            if !package_dir.is_dir() {
                continue;
            }
            let candidate = package_dir.join(relative);
            if candidate.exists() {
                return Ok(candidate);
            }
        }
        Err(UrdfError::UnresolvedResource {
            uri: uri.into(),
            reason: format!("package '{package}' not found in {} search roots", self.roots.len()),
        })
    }
}

impl ResourceRetriever for PackageResourceRetriever {
    fn resolve(&self, uri: &str) -> Result<PathBuf, UrdfError> {
        match uri.strip_prefix(PACKAGE_SCHEME) {
            Some(rest) => self.resolve_package(uri, rest),
            None => self.local.resolve(uri),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Create `<tmp>/gravcomp-resource-<tag>-<pid>/<pkg>/meshes/link.stl`.
    fn package_tree(tag: &str, pkg: &str) -> PathBuf {
        let root = env::temp_dir().join(format!("gravcomp-resource-{tag}-{}", std::process::id()));
        let meshes = root.join(pkg).join("meshes");
        std::fs::create_dir_all(&meshes).unwrap();
        std::fs::write(meshes.join("link.stl"), b"solid link").unwrap();
        root
    }

    // -- LocalResourceRetriever --

    #[test]
    fn local_resolves_existing_absolute_path() {
        let root = package_tree("local-abs", "arm");
        let path = root.join("arm/meshes/link.stl");
        let retriever = LocalResourceRetriever::new();
        assert_eq!(retriever.resolve(path.to_str().unwrap()).unwrap(), path);
        let uri = format!("file://{}", path.display());
        assert_eq!(retriever.resolve(&uri).unwrap(), path);
    }

    #[test]
    fn local_resolves_relative_to_base() {
        let root = package_tree("local-rel", "arm");
        let retriever = LocalResourceRetriever::with_base_dir(&root);
        assert!(retriever.exists("arm/meshes/link.stl"));
        assert!(!retriever.exists("arm/meshes/missing.stl"));
    }

    #[test]
    fn local_rejects_unknown_scheme() {
        let retriever = LocalResourceRetriever::new();
        let err = retriever.resolve("http://example.com/link.stl").unwrap_err();
        assert!(matches!(err, UrdfError::UnresolvedResource { .. }));
    }

    // -- PackageResourceRetriever --

    #[test]
    fn package_resolves_under_root() {
        let root = package_tree("pkg-root", "arm");
        let retriever = PackageResourceRetriever::new([&root]);
        let path = retriever.resolve("package://arm/meshes/link.stl").unwrap();
        assert_eq!(path, root.join("arm/meshes/link.stl"));
        assert_eq!(retriever.retrieve("package://arm/meshes/link.stl").unwrap(), b"solid link");
    }

    #[test]
    fn package_root_may_be_package_dir() {
        let root = package_tree("pkg-self", "gripper");
        let retriever = PackageResourceRetriever::new([root.join("gripper")]);
        assert!(retriever.exists("package://gripper/meshes/link.stl"));
    }

    #[test]
    fn package_missing_is_unresolved() {
        let root = package_tree("pkg-missing", "arm");
        let retriever = PackageResourceRetriever::new([&root]);
        let err = retriever.resolve("package://leg/meshes/link.stl").unwrap_err();
        match err {
            UrdfError::UnresolvedResource { reason, .. } => assert!(reason.contains("'leg'")),
            other => panic!("expected UnresolvedResource, got {other:?}"),
        }
        assert!(!retriever.exists("package:///meshes/link.stl"));
    }

    #[test]
    fn package_falls_back_to_local() {
        let root = package_tree("pkg-local", "arm");
        let retriever = PackageResourceRetriever::new(Vec::<PathBuf>::new()).with_base_dir(&root);
        assert!(retriever.exists("arm/meshes/link.stl"));
        assert!(retriever.roots().is_empty());
    }

    #[test]
    fn retrieve_missing_file_fails() {
        let retriever = LocalResourceRetriever::new();
        assert!(retriever.retrieve("/nonexistent/gravcomp/link.stl").is_err());
    }
}
