//! Resource fetching and caching
//!
//! The resource manager materializes include descriptors into local paths.
//! A fetch for a given (lock root, resource key, descriptor) happens at most
//! once; repeated requests reuse the cached result. Cache population is
//! guarded by an exclusive `fs2` lock scoped to the project root so that
//! concurrent fetches of distinct includes never race on the shared cache.
//!
//! Transports live behind the [`ResourceFetcher`] trait. The in-tree
//! [`LocalFetcher`] handles filesystem paths and `file:`/`path:` URLs;
//! network and VCS transports plug in through the same seam.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::Serialize;
use thiserror::Error;

use crate::domain::IncludeSpec;
use crate::storage::Project;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to fetch resource '{key}' from '{url}': {reason}")]
    Fetch {
        key: String,
        url: String,
        reason: String,
    },

    #[error("failed to lock resource cache: {0}")]
    Lock(#[source] std::io::Error),
}

/// What a fetched resource materialized as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Directory,
    File,
}

/// The immutable result of fetching an include
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    /// The descriptor URL this was fetched from
    pub url: String,

    /// Local materialization of the resource
    pub local_path: PathBuf,

    /// Directory or plain file
    pub kind: ResourceKind,

    /// When the fetch happened
    pub fetched_at: DateTime<Utc>,
}

/// Transport seam for resource fetching.
///
/// `base` is the directory of the descriptor declaring the include, used to
/// resolve relative URLs. `dest` is a reserved cache slot the transport may
/// populate; in-place materializations (local paths) ignore it.
pub trait ResourceFetcher: Send + Sync {
    fn fetch(
        &self,
        spec: &IncludeSpec,
        base: &Path,
        dest: &Path,
    ) -> anyhow::Result<(PathBuf, ResourceKind)>;
}

/// Fetcher for resources already on the local filesystem
pub struct LocalFetcher;

impl ResourceFetcher for LocalFetcher {
    fn fetch(
        &self,
        spec: &IncludeSpec,
        base: &Path,
        _dest: &Path,
    ) -> anyhow::Result<(PathBuf, ResourceKind)> {
        let raw = spec
            .url
            .strip_prefix("file:")
            .or_else(|| spec.url.strip_prefix("path:"))
            .unwrap_or(&spec.url);

        if let Some(scheme) = url_scheme(raw) {
            anyhow::bail!("no transport available for '{scheme}:' urls");
        }

        let path = if Path::new(raw).is_absolute() {
            PathBuf::from(raw)
        } else {
            base.join(raw)
        };

        let meta = fs::metadata(&path)
            .with_context(|| format!("resource path does not exist: {}", path.display()))?;

        let kind = if meta.is_dir() {
            ResourceKind::Directory
        } else {
            ResourceKind::File
        };

        Ok((path, kind))
    }
}

/// Extracts a URL scheme (`github:...` -> `github`), if any.
///
/// Single-character prefixes are not treated as schemes so that Windows-style
/// drive paths survive.
fn url_scheme(url: &str) -> Option<&str> {
    let (scheme, _) = url.split_once(':')?;
    if scheme.len() > 1 && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
        Some(scheme)
    } else {
        None
    }
}

/// Cache slot identity: (resource key, descriptor digest)
type CacheKey = (String, String);

/// Idempotent, lock-guarded resource fetching for one project
pub struct ResourceManager {
    lock_path: PathBuf,
    resources_dir: PathBuf,
    fetcher: Arc<dyn ResourceFetcher>,
    cache: Mutex<HashMap<CacheKey, Resource>>,
}

impl ResourceManager {
    /// Creates a manager with an explicit transport
    pub fn new(
        lock_path: impl Into<PathBuf>,
        resources_dir: impl Into<PathBuf>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        Self {
            lock_path: lock_path.into(),
            resources_dir: resources_dir.into(),
            fetcher,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Creates the default manager for a project (local transport)
    pub fn for_project(project: &Project) -> Self {
        Self::new(
            project.resources_lock_path(),
            project.resources_dir(),
            Arc::new(LocalFetcher),
        )
    }

    /// Fetches the resource for `key` described by `spec`.
    ///
    /// Identical (key, spec) pairs hit the underlying transport at most once;
    /// later calls return the cached resource.
    pub fn fetch(
        &self,
        key: &str,
        spec: &IncludeSpec,
        base: &Path,
    ) -> Result<Resource, ResourceError> {
        let digest = spec_digest(spec);
        let cache_key = (key.to_string(), digest.clone());

        if let Some(resource) = self
            .cache
            .lock()
            .expect("resource cache poisoned")
            .get(&cache_key)
        {
            return Ok(resource.clone());
        }

        // Serialize cache population across threads and processes sharing
        // this project root.
        let _lock = self.acquire_lock().map_err(ResourceError::Lock)?;

        // Another caller may have populated the slot while we waited.
        if let Some(resource) = self
            .cache
            .lock()
            .expect("resource cache poisoned")
            .get(&cache_key)
        {
            return Ok(resource.clone());
        }

        let dest = self.resources_dir.join(format!("{key}-{digest}"));
        let (local_path, kind) =
            self.fetcher
                .fetch(spec, base, &dest)
                .map_err(|e| ResourceError::Fetch {
                    key: key.to_string(),
                    url: spec.url.clone(),
                    reason: format!("{e:#}"),
                })?;

        let resource = Resource {
            url: spec.url.clone(),
            local_path,
            kind,
            fetched_at: Utc::now(),
        };

        self.cache
            .lock()
            .expect("resource cache poisoned")
            .insert(cache_key, resource.clone());

        Ok(resource)
    }

    /// Opens and exclusively locks the cache lock file.
    ///
    /// The lock is released when the returned file handle drops.
    fn acquire_lock(&self) -> std::io::Result<fs::File> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)?;
        file.lock_exclusive()?;

        Ok(file)
    }
}

/// Short content digest of an include spec, for cache slot identity
fn spec_digest(spec: &IncludeSpec) -> String {
    let encoded = serde_yaml::to_string(spec).unwrap_or_else(|_| spec.url.clone());
    blake3::hash(encoded.as_bytes()).to_hex()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Fetcher that counts transport invocations
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ResourceFetcher for CountingFetcher {
        fn fetch(
            &self,
            _spec: &IncludeSpec,
            _base: &Path,
            dest: &Path,
        ) -> anyhow::Result<(PathBuf, ResourceKind)> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            fs::create_dir_all(dest)?;
            Ok((dest.to_path_buf(), ResourceKind::Directory))
        }
    }

    struct FailingFetcher;

    impl ResourceFetcher for FailingFetcher {
        fn fetch(
            &self,
            _spec: &IncludeSpec,
            _base: &Path,
            _dest: &Path,
        ) -> anyhow::Result<(PathBuf, ResourceKind)> {
            anyhow::bail!("transport unavailable")
        }
    }

    fn manager_with(dir: &TempDir, fetcher: Arc<dyn ResourceFetcher>) -> ResourceManager {
        ResourceManager::new(
            dir.path().join("resources.lock"),
            dir.path().join("resources"),
            fetcher,
        )
    }

    #[test]
    fn fetch_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(CountingFetcher::new());
        let manager = manager_with(&dir, fetcher.clone());
        let spec = IncludeSpec::url("./lib");

        let first = manager.fetch("app-lib", &spec, dir.path()).unwrap();
        let second = manager.fetch("app-lib", &spec, dir.path()).unwrap();

        assert_eq!(first.local_path, second.local_path);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_keys_get_distinct_slots() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(CountingFetcher::new());
        let manager = manager_with(&dir, fetcher.clone());
        let spec = IncludeSpec::url("./lib");

        // Same include name under two parent blueprints with different
        // metadata names must never collide.
        let a = manager.fetch("app-foo", &spec, dir.path()).unwrap();
        let b = manager.fetch("other-foo", &spec, dir.path()).unwrap();

        assert_ne!(a.local_path, b.local_path);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn distinct_specs_get_distinct_slots() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(CountingFetcher::new());
        let manager = manager_with(&dir, fetcher.clone());

        let a = manager
            .fetch("app-lib", &IncludeSpec::url("./lib"), dir.path())
            .unwrap();
        let b = manager
            .fetch("app-lib", &IncludeSpec::url("./lib-v2"), dir.path())
            .unwrap();

        assert_ne!(a.local_path, b.local_path);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn transport_failure_surfaces_key_and_url() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with(&dir, Arc::new(FailingFetcher));

        let err = manager
            .fetch("app-lib", &IncludeSpec::url("github:org/repo"), dir.path())
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("app-lib"));
        assert!(message.contains("github:org/repo"));
    }

    #[test]
    fn local_fetcher_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let lib = dir.path().join("vendor").join("lib");
        fs::create_dir_all(&lib).unwrap();

        let (path, kind) = LocalFetcher
            .fetch(
                &IncludeSpec::url("./vendor/lib"),
                dir.path(),
                &dir.path().join("unused"),
            )
            .unwrap();

        assert_eq!(path, dir.path().join("./vendor/lib"));
        assert_eq!(kind, ResourceKind::Directory);
    }

    #[test]
    fn local_fetcher_classifies_plain_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "hello").unwrap();

        let (_, kind) = LocalFetcher
            .fetch(
                &IncludeSpec::url("notes.txt"),
                dir.path(),
                &dir.path().join("unused"),
            )
            .unwrap();

        assert_eq!(kind, ResourceKind::File);
    }

    #[test]
    fn local_fetcher_rejects_remote_schemes() {
        let dir = TempDir::new().unwrap();

        let err = LocalFetcher
            .fetch(
                &IncludeSpec::url("github:org/repo"),
                dir.path(),
                &dir.path().join("unused"),
            )
            .unwrap_err();

        assert!(err.to_string().contains("github"));
    }

    #[test]
    fn missing_local_path_is_a_fetch_error() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with(&dir, Arc::new(LocalFetcher));

        let result = manager.fetch("app-gone", &IncludeSpec::url("./nope"), dir.path());
        assert!(matches!(result, Err(ResourceError::Fetch { .. })));
    }
}
