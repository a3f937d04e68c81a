//! Workload selectors (Sidecar `workloadSelector`, AuthorizationPolicy
//! `selector`) must pick at least one pod in the object's namespace.

use crate::checkers::{matching_pods, Checker};
use crate::checks::{is_valid, CheckKind};
use crate::models::resources::{Labels, Pod};
use crate::models::Check;

pub struct WorkloadSelectorChecker<'a> {
    pub namespace: &'a str,
    pub pods: &'a [Pod],
    /// `None` or an empty map selects every workload and is not checked.
    pub labels: Option<&'a Labels>,
    pub path: &'static str,
}

impl Checker for WorkloadSelectorChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        if let Some(labels) = self.labels.filter(|l| !l.is_empty()) {
            if matching_pods(self.pods, Some(self.namespace), labels).next().is_none() {
                checks.push(CheckKind::SelectorWorkloadNotFound.at(self.path));
            }
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::fixtures::pod;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_selector_scoped_to_namespace() {
        let pods = [pod("bookinfo", "details-v1", &[("app", "details")])];
        let selector = labels(&[("app", "details")]);
        let run = |namespace| {
            WorkloadSelectorChecker {
                namespace,
                pods: &pods,
                labels: Some(&selector),
                path: "spec/workloadSelector",
            }
            .check()
        };
        assert_eq!(run("bookinfo"), (vec![], true));

        let (checks, valid) = run("eshop");
        assert!(valid);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].code, "KIA0004");
        assert_eq!(checks[0].path, "spec/workloadSelector");
    }

    #[test]
    fn test_absent_or_empty_selector_is_not_checked() {
        let empty = Labels::new();
        for labels in [None, Some(&empty)] {
            let checker = WorkloadSelectorChecker {
                namespace: "bookinfo",
                pods: &[],
                labels,
                path: "spec/selector",
            };
            assert_eq!(checker.check(), (vec![], true));
        }
    }
}
