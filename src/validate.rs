//! Validation runner behind `meshcheck validate` and `meshcheck summary`.
//!
//! Loads the snapshot, builds the engine from the effective configuration,
//! runs it and narrows the report to the configured namespace.

use crate::config::Effective;
use crate::engine::Engine;
use crate::error::Result;
use crate::snapshot::Snapshot;
use crate::validations::ValidationReport;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Snapshot paths are taken as given when they exist, else relative to the
/// repository root.
pub fn resolve_snapshot_path(eff: &Effective, snapshot: &str) -> PathBuf {
    let given = Path::new(snapshot);
    if given.exists() || given.is_absolute() {
        given.to_path_buf()
    } else {
        eff.repo_root.join(given)
    }
}

/// Validate the snapshot at `snapshot_path` with the effective settings.
pub fn run_validate(eff: &Effective, snapshot_path: &Path) -> Result<ValidationReport> {
    let snapshot = Snapshot::from_path(snapshot_path)?;
    info!(
        path = %snapshot_path.display(),
        objects = snapshot.validated_object_count(),
        "snapshot loaded"
    );
    let engine = Engine::new(eff.engine_settings())?;
    let report = engine.run(&snapshot);
    Ok(match eff.namespace.as_deref() {
        Some(ns) => {
            debug!(namespace = ns, "narrowing report");
            report.for_namespace(ns)
        }
        None => report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolve_effective;
    use crate::error::{Error, SnapshotError};
    use std::fs;
    use tempfile::tempdir;

    const SNAPSHOT: &str = r#"
kind: Service
metadata: {name: reviews, namespace: bookinfo}
---
kind: VirtualService
metadata: {name: reviews, namespace: bookinfo}
spec:
  hosts: [reviews]
  http:
    - route:
        - destination: {host: reviews}
---
kind: VirtualService
metadata: {name: cart, namespace: eshop}
spec:
  hosts: [cart]
  http:
    - route:
        - destination: {host: cart}
"#;

    #[test]
    fn test_validate_with_namespace_filter() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("snapshot.yaml"), SNAPSHOT).unwrap();
        fs::write(root.join("meshcheck.toml"), "concurrency = 2\n").unwrap();

        let eff = resolve_effective(root.to_str(), None, None, None).unwrap();
        let path = resolve_snapshot_path(&eff, "snapshot.yaml");
        assert_eq!(path, root.join("snapshot.yaml"));
        let report = run_validate(&eff, &path).unwrap();
        assert_eq!(report.validations().len(), 2);
        assert!(report.has_errors());

        let eff = resolve_effective(root.to_str(), None, Some("bookinfo"), None).unwrap();
        let report = run_validate(&eff, &path).unwrap();
        assert_eq!(report.validations().len(), 1);
        assert!(!report.has_errors());
    }

    #[test]
    fn test_missing_snapshot_is_error() {
        let dir = tempdir().unwrap();
        let eff = resolve_effective(dir.path().to_str(), None, None, Some(1)).unwrap();
        let path = resolve_snapshot_path(&eff, "absent.yaml");
        let err = run_validate(&eff, &path).unwrap_err();
        assert!(matches!(err, Error::Snapshot(SnapshotError::Io { .. })));
    }
}
