//! Checkers for AuthorizationPolicies.
//!
//! Workload selection is covered by
//! [`WorkloadSelectorChecker`](crate::checkers::selector::WorkloadSelectorChecker).

use crate::checkers::Checker;
use crate::checks::{is_valid, CheckKind};
use crate::host::WILDCARD;
use crate::models::resources::AuthorizationPolicy;
use crate::models::Check;
use crate::registry::ServiceRegistry;

/// Drop a trailing `:port` from a host entry.
fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Cluster-local forms: `*.namespace` or a name under the cluster domain.
/// Other dotted names are external hosts, whose second label is not a
/// namespace.
fn is_cluster_local(hostname: &str, cluster_domain: &str) -> bool {
    match hostname.strip_suffix(cluster_domain) {
        Some(rest) if rest.ends_with('.') => true,
        _ => hostname
            .strip_prefix("*.")
            .is_some_and(|namespace| !namespace.is_empty() && !namespace.contains('.')),
    }
}

/// Hosts in `to.operation.hosts` must name a known service. When a
/// cluster-local host points into a namespace the snapshot does not contain,
/// the finding is `unknown` rather than an error.
pub struct NoHostChecker<'a> {
    pub namespace: &'a str,
    pub registry: &'a ServiceRegistry,
    pub authorization_policy: &'a AuthorizationPolicy,
}

impl Checker for NoHostChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        for (i, rule) in self.authorization_policy.spec.rules.iter().enumerate() {
            for (j, to) in rule.to.iter().enumerate() {
                let Some(operation) = to.operation.as_ref() else {
                    continue;
                };
                for (k, raw) in operation.hosts.iter().enumerate() {
                    let hostname = strip_port(raw);
                    if self.registry.resolves(hostname, self.namespace) {
                        continue;
                    }
                    let path = format!("spec/rules[{}]/to[{}]/operation/hosts[{}]", i, j, k);
                    let host = self.registry.parse(hostname, self.namespace);
                    if is_cluster_local(hostname, self.registry.cluster_domain())
                        && host.namespace != WILDCARD
                        && !self.registry.has_namespace(&host.namespace)
                    {
                        checks.push(CheckKind::AuthzHostNamespaceUnknown.at(path));
                    } else {
                        checks.push(CheckKind::AuthzHostNotFound.at(path));
                    }
                }
            }
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}

/// Namespaces listed in `from.source.namespaces` must exist.
pub struct SourceNamespaceChecker<'a> {
    pub registry: &'a ServiceRegistry,
    pub authorization_policy: &'a AuthorizationPolicy,
}

impl Checker for SourceNamespaceChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        for (i, rule) in self.authorization_policy.spec.rules.iter().enumerate() {
            for (j, from) in rule.from.iter().enumerate() {
                let Some(source) = from.source.as_ref() else {
                    continue;
                };
                for (k, namespace) in source.namespaces.iter().enumerate() {
                    if namespace.contains('*') || self.registry.has_namespace(namespace) {
                        continue;
                    }
                    checks.push(
                        CheckKind::AuthzSourceNamespaceNotFound
                            .at(format!("spec/rules[{}]/from[{}]/source/namespaces[{}]", i, j, k)),
                    );
                }
            }
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}
