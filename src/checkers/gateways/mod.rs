//! Checkers for Gateways.

mod multi_match;

pub use multi_match::MultiMatchChecker;

use crate::checkers::{matching_pods, Checker};
use crate::checks::{is_valid, CheckKind};
use crate::models::resources::{Gateway, Pod};
use crate::models::Check;

/// The selector of a gateway must pick at least one workload. Ingress
/// gateways usually live in another namespace, so every pod is a candidate.
pub struct SelectorChecker<'a> {
    pub pods: &'a [Pod],
    pub gateway: &'a Gateway,
}

impl Checker for SelectorChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        let selector = &self.gateway.spec.selector;
        if !selector.is_empty() && matching_pods(self.pods, None, selector).next().is_none() {
            checks.push(CheckKind::GatewaySelectorNoWorkload.at("spec/selector"));
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
    fn test_selector_matches_pod_in_other_namespace() {
        let gw: Gateway = object(
            "metadata: {name: gw, namespace: bookinfo}\nspec:\n  selector: {istio: ingressgateway}\n",
        );
        let pods = [pod("istio-system", "ingress", &[("istio", "ingressgateway")])];
        let (checks, valid) = SelectorChecker { pods: &pods, gateway: &gw }.check();
        assert!(checks.is_empty());
        assert!(valid);

        let (checks, valid) = SelectorChecker { pods: &[], gateway: &gw }.check();
        assert!(valid);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].severity, Severity::Warning);
        assert_eq!(checks[0].path, "spec/selector");
    }

    #[test]
    fn test_empty_selector_is_not_checked() {
        let gw: Gateway = object("metadata: {name: gw, namespace: bookinfo}\nspec: {}\n");
        assert_eq!(SelectorChecker { pods: &[], gateway: &gw }.check(), (vec![], true));
    }
}
