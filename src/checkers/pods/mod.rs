//! Checkers for Pods.

use crate::checkers::Checker;
use crate::checks::{is_valid, CheckKind};
use crate::models::resources::Pod;
use crate::models::Check;

/// A pod in the mesh should run the proxy container.
pub struct SidecarPresenceChecker<'a> {
    pub proxy_container: &'a str,
    pub pod: &'a Pod,
}

impl Checker for SidecarPresenceChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        if !self.pod.spec.containers.iter().any(|c| c.name == self.proxy_container) {
            checks.push(CheckKind::PodMissingSidecar.at("spec/containers"));
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}

/// A pod should carry the configured app and version labels.
pub struct LabelPresenceChecker<'a> {
    pub app_label: &'a str,
    pub version_label: &'a str,
    pub pod: &'a Pod,
}

impl Checker for LabelPresenceChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let labels = &self.pod.metadata.labels;
        let mut checks = Vec::new();
        if !labels.contains_key(self.app_label) {
            checks.push(CheckKind::PodMissingAppLabel.at("metadata/labels"));
        }
        if !labels.contains_key(self.version_label) {
            checks.push(CheckKind::PodMissingVersionLabel.at("metadata/labels"));
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::fixtures::{object, pod};
    use crate::models::Severity;

    #[test]
    fn test_sidecar_presence() {
        let with_proxy = pod("bookinfo", "reviews-v1", &[]);
        let check = SidecarPresenceChecker {
            proxy_container: "istio-proxy",
            pod: &with_proxy,
        };
        assert_eq!(check.check(), (vec![], true));

        let bare: Pod = object("metadata: {name: p, namespace: bookinfo}\nspec:\n  containers: [{name: app}]\n");
        let (checks, valid) = SidecarPresenceChecker {
            proxy_container: "istio-proxy",
            pod: &bare,
        }
        .check();
        assert!(valid);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].severity, Severity::Warning);
        assert_eq!(checks[0].path, "spec/containers");
    }

    #[test]
    fn test_label_presence_uses_configured_names() {
        let p = pod("bookinfo", "reviews-v1", &[("app", "reviews"), ("version", "v1")]);
        let default = LabelPresenceChecker {
            app_label: "app",
            version_label: "version",
            pod: &p,
        };
        assert_eq!(default.check(), (vec![], true));

        let custom = LabelPresenceChecker {
            app_label: "app.kubernetes.io/name",
            version_label: "version",
            pod: &p,
        };
        let (checks, valid) = custom.check();
        assert!(valid);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].message, "Pod has no app label");
    }
}
