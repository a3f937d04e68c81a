//! Destinations naming a subset must find it, with labels, on a matching
//! DestinationRule.

use super::{find_subset, route_destinations};
use crate::checkers::Checker;
use crate::checks::{is_valid, CheckKind};
use crate::host::Host;
use crate::models::resources::{DestinationRule, VirtualService};
use crate::models::Check;

pub struct SubsetPresenceChecker<'a> {
    pub namespace: &'a str,
    pub cluster_domain: &'a str,
    pub destination_rules: &'a [DestinationRule],
    pub virtual_service: &'a VirtualService,
}

impl Checker for SubsetPresenceChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        for (path, dw) in route_destinations(self.virtual_service) {
            let Some(destination) = dw.destination.as_ref() else {
                checks.push(CheckKind::VirtualServiceDestinationMandatory.at(path));
                continue;
            };
            let (Some(host), Some(subset)) = (destination.host.as_deref(), destination.subset.as_deref())
            else {
                continue;
            };
            let host = Host::parse(host, self.namespace, self.cluster_domain);
            if find_subset(self.destination_rules, &host, subset, self.cluster_domain).is_none() {
                checks.push(CheckKind::VirtualServiceSubsetNotFound.at(format!("{}/destination", path)));
            }
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}
