//! The host of a DestinationRule must name a known service, and its subsets
//! must select running pods of that service.

use crate::checkers::{matching_pods, Checker};
use crate::checks::{is_valid, CheckKind};
use crate::host::WILDCARD;
use crate::models::resources::{DestinationRule, Pod};
use crate::models::Check;
use crate::registry::ServiceRegistry;

pub struct NoDestinationChecker<'a> {
    pub namespace: &'a str,
    pub registry: &'a ServiceRegistry,
    pub pods: &'a [Pod],
    pub destination_rule: &'a DestinationRule,
}

impl NoDestinationChecker<'_> {
    fn check_subsets(&self, hostname: &str, checks: &mut Vec<Check>) {
        let host = self.registry.parse(hostname, self.namespace);
        // subsets of external hosts cannot be matched against pods
        let internal = self.registry.matching_services(&host).next().is_some();
        let namespace = (host.namespace != WILDCARD).then_some(host.namespace.as_str());

        for (i, subset) in self.destination_rule.spec.subsets.iter().enumerate() {
            let path = format!("spec/subsets[{}]", i);
            if subset.labels.is_empty() {
                checks.push(CheckKind::DestinationRuleSubsetNoLabels.at(path));
            } else if internal && matching_pods(self.pods, namespace, &subset.labels).next().is_none() {
                checks.push(CheckKind::DestinationRuleSubsetLabelsNotFound.at(path));
            }
        }
    }
}

impl Checker for NoDestinationChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        if let Some(hostname) = self.destination_rule.spec.host.as_deref() {
            if self.registry.resolves(hostname, self.namespace) {
                self.check_subsets(hostname, &mut checks);
            } else {
                checks.push(CheckKind::DestinationRuleHostNotFound.at("spec/host"));
            }
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}
