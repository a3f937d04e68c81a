//! Subsets referenced by routes should select at least one running pod in
//! the destination namespace.

use super::{find_subset, route_destinations};
use crate::checkers::{matching_pods, Checker};
use crate::checks::{is_valid, CheckKind};
use crate::host::{Host, WILDCARD};
use crate::models::resources::{DestinationRule, Pod, VirtualService};
use crate::models::Check;

pub struct VersionPresenceChecker<'a> {
    pub namespace: &'a str,
    pub cluster_domain: &'a str,
    pub pods: &'a [Pod],
    pub destination_rules: &'a [DestinationRule],
    pub virtual_service: &'a VirtualService,
}

impl Checker for VersionPresenceChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        for (path, dw) in route_destinations(self.virtual_service) {
            let Some(destination) = dw.destination.as_ref() else {
                continue;
            };
            let (Some(host), Some(subset)) = (destination.host.as_deref(), destination.subset.as_deref())
            else {
                continue;
            };
            let host = Host::parse(host, self.namespace, self.cluster_domain);
            // unresolved subsets are reported by the subset presence checker
            let Some((_, subset)) = find_subset(self.destination_rules, &host, subset, self.cluster_domain)
            else {
                continue;
            };
            let namespace = (host.namespace != WILDCARD).then_some(host.namespace.as_str());
            if matching_pods(self.pods, namespace, &subset.labels).next().is_none() {
                checks.push(CheckKind::VirtualServiceSubsetNoPods.at(format!("{}/destination", path)));
            }
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}
