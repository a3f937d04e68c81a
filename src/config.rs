//! Configuration discovery and effective settings resolution.
//!
//! meshcheck reads `meshcheck.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config. Defaults:
//! - `output`: `human`
//! - `namespace`: none (report every namespace)
//! - `concurrency`: available parallelism
//! - `cluster_domain`: `svc.cluster.local`
//! - `labels.app|version`: `app` / `version`
//! - `proxy_container`: `istio-proxy`
//! - `ignore`, `severity`: empty
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::engine::{default_concurrency, EngineSettings};
use crate::error::ConfigError;
use crate::host::DEFAULT_CLUSTER_DOMAIN;
use crate::validations::ReportPolicy;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILES: [&str; 3] = ["meshcheck.toml", "meshcheck.yaml", "meshcheck.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Label names used by the pod checks, under `[labels]`.
pub struct LabelsCfg {
    pub app: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `meshcheck.toml|yaml`.
pub struct MeshcheckConfig {
    pub output: Option<String>,
    pub namespace: Option<String>,
    pub concurrency: Option<usize>,
    pub cluster_domain: Option<String>,
    pub proxy_container: Option<String>,
    pub root_namespace: Option<String>,
    #[serde(default)]
    pub labels: Option<LabelsCfg>,
    /// Check codes dropped from every report, e.g. `["KIA0902"]`.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Per-code severity override: `KIA1106 = "error"`.
    #[serde(default)]
    pub severity: HashMap<String, String>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_file: Option<PathBuf>,
    pub output: String,
    pub namespace: Option<String>,
    pub concurrency: usize,
    pub cluster_domain: String,
    pub app_label: String,
    pub version_label: String,
    pub proxy_container: String,
    pub root_namespace: String,
    pub ignore: Vec<String>,
    pub severity: HashMap<String, String>,
}

impl Effective {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            cluster_domain: self.cluster_domain.clone(),
            concurrency: self.concurrency,
            app_label: self.app_label.clone(),
            version_label: self.version_label.clone(),
            proxy_container: self.proxy_container.clone(),
            root_namespace: self.root_namespace.clone(),
            policy: ReportPolicy::from_config(&self.ignore, &self.severity),
        }
    }
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `meshcheck.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|f| cur.join(f).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Path of the config file in `root`, TOML first.
pub fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|f| root.join(f))
        .find(|p| p.exists())
}

/// Load `MeshcheckConfig` from `root` if a config file is present.
pub fn load_config(root: &Path) -> Result<Option<MeshcheckConfig>, ConfigError> {
    let Some(path) = find_config(root) else {
        return Ok(None);
    };
    let s = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let is_toml = path.extension().map(|e| e == "toml").unwrap_or(false);
    let cfg = if is_toml {
        toml::from_str(&s).map_err(|source| ConfigError::Toml { path, source })?
    } else {
        serde_yaml::from_str(&s).map_err(|source| ConfigError::Yaml { path, source })?
    };
    Ok(Some(cfg))
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_output: Option<&str>,
    cli_namespace: Option<&str>,
    cli_concurrency: Option<usize>,
) -> Result<Effective, ConfigError> {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let config_file = find_config(&repo_root);
    let cfg = load_config(&repo_root)?.unwrap_or_default();

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    if output != "human" && output != "json" {
        return Err(ConfigError::InvalidValue {
            field: "output",
            value: output,
        });
    }

    let namespace = cli_namespace.map(|s| s.to_string()).or(cfg.namespace);

    let concurrency = cli_concurrency
        .or(cfg.concurrency)
        .unwrap_or_else(default_concurrency);
    if concurrency == 0 {
        return Err(ConfigError::InvalidValue {
            field: "concurrency",
            value: concurrency.to_string(),
        });
    }

    let labels = cfg.labels.unwrap_or_default();

    Ok(Effective {
        repo_root,
        config_file,
        output,
        namespace,
        concurrency,
        cluster_domain: cfg
            .cluster_domain
            .unwrap_or_else(|| DEFAULT_CLUSTER_DOMAIN.to_string()),
        app_label: labels.app.unwrap_or_else(|| "app".to_string()),
        version_label: labels.version.unwrap_or_else(|| "version".to_string()),
        proxy_container: cfg
            .proxy_container
            .unwrap_or_else(|| "istio-proxy".to_string()),
        root_namespace: cfg
            .root_namespace
            .unwrap_or_else(|| "istio-system".to_string()),
        ignore: cfg.ignore,
        severity: cfg.severity,
    })
}
