//! mTLS consistency between DestinationRules and PeerAuthentications.
//!
//! A rule is mesh-wide when its host is `*.local` or `*`, and namespace-wide
//! when its host is `*.<namespace>.<cluster domain>`.

use crate::checkers::{Checker, GroupChecker};
use crate::checks::{is_valid, CheckKind};
use crate::host::{Host, WILDCARD};
use crate::models::resources::{DestinationRule, PeerAuthentication};
use crate::models::{Check, ConfigObjectRef, ObjectType};
use crate::validations::ValidationSet;
use std::collections::BTreeSet;

const ISTIO_MUTUAL: &str = "ISTIO_MUTUAL";

fn is_mesh_wide(hostname: &str) -> bool {
    hostname == WILDCARD || hostname == "*.local"
}

/// Namespace targeted by a namespace-wide host.
fn namespace_wide_target<'h>(hostname: &'h str, cluster_domain: &str) -> Option<&'h str> {
    let namespace = hostname
        .strip_prefix("*.")?
        .strip_suffix(cluster_domain)?
        .strip_suffix('.')?;
    (!namespace.is_empty() && !namespace.contains('.') && namespace != WILDCARD).then_some(namespace)
}

fn tls_mode(rule: &DestinationRule) -> Option<&str> {
    rule.spec.traffic_policy.as_ref().and_then(|tp| tp.tls_mode())
}

/// Namespace-wide rules that disable mTLS while a PeerAuthentication for
/// the same namespace (or, without one, the mesh) enforces STRICT mode.
pub struct DisabledNamespaceWideMtlsChecker<'a> {
    pub cluster_domain: &'a str,
    pub root_namespace: &'a str,
    pub peer_authentications: &'a [PeerAuthentication],
    pub destination_rule: &'a DestinationRule,
}

impl DisabledNamespaceWideMtlsChecker<'_> {
    /// First mode set by a namespace-wide PeerAuthentication in `namespace`,
    /// in name order.
    fn namespace_mode(&self, namespace: &str) -> Option<&str> {
        let mut candidates: Vec<&PeerAuthentication> = self
            .peer_authentications
            .iter()
            .filter(|pa| pa.namespace() == namespace && pa.spec.is_namespace_wide())
            .collect();
        candidates.sort_by(|a, b| a.name().cmp(b.name()));
        candidates.into_iter().find_map(|pa| pa.spec.mode())
    }
}

impl Checker for DisabledNamespaceWideMtlsChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        let target = self
            .destination_rule
            .spec
            .host
            .as_deref()
            .and_then(|h| namespace_wide_target(h, self.cluster_domain));
        if let (Some(namespace), Some("DISABLE")) = (target, tls_mode(self.destination_rule)) {
            let path = "spec/trafficPolicy/tls/mode";
            match self.namespace_mode(namespace) {
                Some("STRICT") => checks.push(CheckKind::DestinationRuleNamespaceStrictMtls.at(path)),
                Some(_) => {}
                None => {
                    if self.namespace_mode(self.root_namespace) == Some("STRICT") {
                        checks.push(CheckKind::DestinationRuleMeshStrictMtls.at(path));
                    }
                }
            }
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}

/// Rules without any TLS settings for a host where mesh-wide or
/// namespace-wide rules turn on `ISTIO_MUTUAL`. The finding references every
/// rule whose TLS settings it overrides.
pub struct TrafficPolicyChecker<'a> {
    pub cluster_domain: &'a str,
    pub destination_rules: &'a [DestinationRule],
}

impl GroupChecker for TrafficPolicyChecker<'_> {
    fn name(&self) -> &'static str {
        "destinationrule_traffic_policy"
    }

    fn check(&self) -> ValidationSet {
        let key = |rule: &DestinationRule| {
            ConfigObjectRef::new(ObjectType::DestinationRule, rule.name(), rule.namespace())
        };
        let mutual: Vec<&DestinationRule> = self
            .destination_rules
            .iter()
            .filter(|rule| tls_mode(rule) == Some(ISTIO_MUTUAL))
            .collect();

        let mut out = ValidationSet::new();
        for rule in self.destination_rules {
            let Some(hostname) = rule.spec.host.as_deref() else {
                continue;
            };
            if rule.spec.traffic_policy.as_ref().is_some_and(|tp| tp.has_tls()) {
                continue;
            }
            let host = Host::parse(hostname, rule.namespace(), self.cluster_domain);
            let mut enabling: BTreeSet<ConfigObjectRef> = BTreeSet::new();
            let mut overridden: BTreeSet<ConfigObjectRef> = BTreeSet::new();
            for other in &mutual {
                let Some(other_host) = other.spec.host.as_deref() else {
                    continue;
                };
                if is_mesh_wide(other_host)
                    || namespace_wide_target(other_host, self.cluster_domain) == Some(host.namespace.as_str())
                {
                    enabling.insert(key(*other));
                } else if Host::parse(other_host, other.namespace(), self.cluster_domain).matches(&host) {
                    overridden.insert(key(*other));
                }
            }
            if enabling.is_empty() {
                continue;
            }
            let record = out.entry(&key(rule));
            record.checks.push(CheckKind::DestinationRuleNoTlsSettings.at("spec/trafficPolicy"));
            record.references.extend(enabling.into_iter().chain(overridden));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::fixtures::object;
    use crate::host::DEFAULT_CLUSTER_DOMAIN;
    use crate::models::Severity;

    fn rule(namespace: &str, name: &str, host: &str, tls: Option<&str>) -> DestinationRule {
        let policy = match tls {
            Some(mode) => format!("\n  trafficPolicy:\n    tls: {{mode: {}}}", mode),
            None => String::new(),
        };
        object(&format!(
            "metadata: {{name: {}, namespace: {}}}\nspec:\n  host: \"{}\"{}\n",
            name, namespace, host, policy
        ))
    }

    fn peer(namespace: &str, name: &str, mode: &str) -> PeerAuthentication {
        object(&format!(
            "metadata: {{name: {}, namespace: {}}}\nspec:\n  mtls: {{mode: {}}}\n",
            name, namespace, mode
        ))
    }

    fn disabled(peers: &[PeerAuthentication], host: &str) -> (Vec<Check>, bool) {
        let dr = rule("bookinfo", "disable-mtls", host, Some("DISABLE"));
        DisabledNamespaceWideMtlsChecker {
            cluster_domain: DEFAULT_CLUSTER_DOMAIN,
            root_namespace: "istio-system",
            peer_authentications: peers,
            destination_rule: &dr,
        }
        .check()
    }

    const NS_WIDE: &str = "*.bookinfo.svc.cluster.local";

    #[test]
    fn test_namespace_wide_target() {
        assert_eq!(namespace_wide_target(NS_WIDE, DEFAULT_CLUSTER_DOMAIN), Some("bookinfo"));
        assert_eq!(namespace_wide_target("*.local", DEFAULT_CLUSTER_DOMAIN), None);
        assert_eq!(namespace_wide_target("reviews.bookinfo.svc.cluster.local", DEFAULT_CLUSTER_DOMAIN), None);
        assert_eq!(namespace_wide_target("*.svc.cluster.local", DEFAULT_CLUSTER_DOMAIN), None);
    }

    #[test]
    fn test_disabled_against_strict_namespace_policy() {
        let (checks, valid) = disabled(&[peer("bookinfo", "default", "STRICT")], NS_WIDE);
        assert!(!valid);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].code, "KIA0207");
        assert_eq!(checks[0].severity, Severity::Error);
        assert_eq!(checks[0].path, "spec/trafficPolicy/tls/mode");
    }

    #[test]
    fn test_disabled_against_strict_mesh_policy() {
        let (checks, valid) = disabled(&[peer("istio-system", "default", "STRICT")], NS_WIDE);
        assert!(!valid);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].code, "KIA0208");
    }

    #[test]
    fn test_namespace_policy_takes_precedence_over_mesh() {
        for mode in ["PERMISSIVE", "DISABLE"] {
            let peers = [peer("bookinfo", "default", mode), peer("istio-system", "default", "STRICT")];
            assert_eq!(disabled(&peers, NS_WIDE), (vec![], true));
        }
    }

    #[test]
    fn test_disabled_without_strict_policy_is_fine() {
        assert_eq!(disabled(&[], NS_WIDE), (vec![], true));
        assert_eq!(disabled(&[peer("istio-system", "default", "PERMISSIVE")], NS_WIDE), (vec![], true));
        assert_eq!(disabled(&[peer("bookinfo", "default", "STRICT")], "*.local"), (vec![], true));
    }

    #[test]
    fn test_workload_policy_is_not_namespace_wide() {
        let scoped: PeerAuthentication = object(
            "metadata: {name: reviews, namespace: bookinfo}\nspec:\n  selector: {matchLabels: {app: reviews}}\n  mtls: {mode: STRICT}\n",
        );
        assert_eq!(disabled(&[scoped], NS_WIDE), (vec![], true));
    }

    fn traffic(rules: &[DestinationRule]) -> ValidationSet {
        TrafficPolicyChecker {
            cluster_domain: DEFAULT_CLUSTER_DOMAIN,
            destination_rules: rules,
        }
        .check()
    }

    fn key(namespace: &str, name: &str) -> ConfigObjectRef {
        ConfigObjectRef::new(ObjectType::DestinationRule, name, namespace)
    }

    #[test]
    fn test_rule_without_tls_under_mesh_wide_mtls() {
        let rules = [
            rule("istio-system", "default", "*.local", Some(ISTIO_MUTUAL)),
            rule("bookinfo", "default", NS_WIDE, Some(ISTIO_MUTUAL)),
            rule("bookinfo2", "reviews", "reviews.bookinfo.svc.cluster.local", Some(ISTIO_MUTUAL)),
            rule("bookinfo", "reviews", "reviews", None),
        ];
        let out = traffic(&rules);
        assert_eq!(out.len(), 1);
        let record = out.get(&key("bookinfo", "reviews")).unwrap();
        assert!(record.valid);
        assert_eq!(record.checks[0].path, "spec/trafficPolicy");
        assert_eq!(record.checks[0].severity, Severity::Warning);
        assert!(record.references.contains(&key("istio-system", "default")));
        assert!(record.references.contains(&key("bookinfo", "default")));
        assert!(record.references.contains(&key("bookinfo2", "reviews")));
    }

    #[test]
    fn test_rule_with_tls_is_not_flagged() {
        let port_level: DestinationRule = object(
            "metadata: {name: reviews, namespace: bookinfo}\nspec:\n  host: reviews\n  trafficPolicy:\n    portLevelSettings:\n      - tls: {mode: SIMPLE}\n",
        );
        let rules = [
            rule("bookinfo", "default", "*.local", Some(ISTIO_MUTUAL)),
            port_level,
        ];
        assert!(traffic(&rules).is_empty());
    }

    #[test]
    fn test_namespace_wide_mtls_does_not_cross_namespaces() {
        let rules = [
            rule("bookinfo", "default", NS_WIDE, Some(ISTIO_MUTUAL)),
            rule("other", "reviews", "reviews.other.svc.cluster.local", None),
            rule("other", "service-entry-dr", "wikipedia.org", None),
        ];
        assert!(traffic(&rules).is_empty());
    }
}
