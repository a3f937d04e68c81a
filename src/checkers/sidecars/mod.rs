//! Checkers for Sidecars.
//!
//! Workload selection is covered by
//! [`WorkloadSelectorChecker`](crate::checkers::selector::WorkloadSelectorChecker).

use crate::checkers::Checker;
use crate::checks::{is_valid, CheckKind};
use crate::host::WILDCARD;
use crate::models::resources::Sidecar;
use crate::models::Check;
use crate::registry::ServiceRegistry;

/// Egress hosts (`namespace/dnsName`) must name something the registry knows.
/// Only a bare `*` DNS name is exempt; `*.suffix` names must still match a
/// registered host.
pub struct EgressHostChecker<'a> {
    pub namespace: &'a str,
    pub registry: &'a ServiceRegistry,
    pub sidecar: &'a Sidecar,
}

impl EgressHostChecker<'_> {
    fn known(&self, entry: &str) -> bool {
        let (namespace, host) = entry.split_once('/').unwrap_or((".", entry));
        if host == WILDCARD {
            return true;
        }
        let namespace = match namespace {
            "." | "~" | WILDCARD => self.namespace,
            ns => ns,
        };
        self.registry.resolves(host, namespace)
    }
}

impl Checker for EgressHostChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        for (i, listener) in self.sidecar.spec.egress.iter().enumerate() {
            for (j, entry) in listener.hosts.iter().enumerate() {
                if !self.known(entry) {
                    checks.push(CheckKind::SidecarEgressHostNotFound.at(format!("spec/egress[{}]/hosts[{}]", i, j)));
                }
            }
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}
