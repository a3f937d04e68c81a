//! Detects VirtualServices that claim the same host for the same gateways.
//!
//! Objects are visited in (namespace, name) order. Each host is probed
//! against the hosts recorded so far in a cluster -> namespace -> service
//! presence map, where `*` at any level overlaps anything. A hit flags the
//! object being visited; the earlier object keeps a clean record but gets a
//! back-reference.

use super::{gateway_ref, MESH_GATEWAY};
use crate::checkers::presence::{flag_collision, HostPresence};
use crate::checkers::{by_namespace_and_name, GroupChecker};
use crate::checks::CheckKind;
use crate::host::Host;
use crate::models::resources::VirtualService;
use crate::models::{ConfigObjectRef, ObjectType};
use crate::validations::ValidationSet;
use std::collections::BTreeSet;

pub struct SingleHostChecker<'a> {
    pub cluster_domain: &'a str,
    pub virtual_services: &'a [VirtualService],
}

struct Claim {
    owner: ConfigObjectRef,
    gateways: BTreeSet<String>,
}

impl SingleHostChecker<'_> {
    fn gateways(&self, vs: &VirtualService) -> BTreeSet<String> {
        let mut set: BTreeSet<String> = vs
            .spec
            .gateways
            .iter()
            .map(|g| gateway_ref(g, vs.namespace(), self.cluster_domain))
            .collect();
        if set.is_empty() {
            set.insert(MESH_GATEWAY.to_string());
        }
        set
    }
}

impl GroupChecker for SingleHostChecker<'_> {
    fn name(&self) -> &'static str {
        "virtualservice_single_host"
    }

    fn check(&self) -> ValidationSet {
        let mut ordered: Vec<&VirtualService> = self.virtual_services.iter().collect();
        ordered.sort_by(|a, b| by_namespace_and_name(&a.metadata, &b.metadata));

        let mut presence: HostPresence<Claim> = HostPresence::new();
        let mut out = ValidationSet::new();

        for vs in ordered {
            let key = ConfigObjectRef::new(ObjectType::VirtualService, vs.name(), vs.namespace());
            let gateways = self.gateways(vs);
            for (i, hostname) in vs.spec.hosts.iter().enumerate() {
                let host = Host::parse(hostname, vs.namespace(), self.cluster_domain);
                let others: BTreeSet<ConfigObjectRef> = presence.overlapping(&host)
                    .filter(|c| c.owner != key && !c.gateways.is_disjoint(&gateways))
                    .map(|c| c.owner.clone())
                    .collect();
                if !others.is_empty() {
                    let check = CheckKind::VirtualServiceSingleHost.at(format!("spec/hosts[{}]", i));
                    flag_collision(&mut out, &key, &others, check);
                }
                presence.insert(
                    &host,
                    Claim {
                        owner: key.clone(),
                        gateways: gateways.clone(),
                    },
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::fixtures::vs;
    use crate::host::DEFAULT_CLUSTER_DOMAIN;
    use crate::models::Severity;

    fn service(name: &str, namespace: &str, hosts: &[&str], gateways: &[&str]) -> VirtualService {
        vs(&format!(
            "metadata: {{name: {}, namespace: {}}}\nspec:\n  hosts: [{}]\n  gateways: [{}]\n",
            name,
            namespace,
            hosts.iter().map(|h| format!("\"{}\"", h)).collect::<Vec<_>>().join(", "),
            gateways.join(", ")
        ))
    }

    fn run(services: &[VirtualService]) -> ValidationSet {
        SingleHostChecker {
            cluster_domain: DEFAULT_CLUSTER_DOMAIN,
            virtual_services: services,
        }
        .check()
    }

    fn key(name: &str) -> ConfigObjectRef {
        ConfigObjectRef::new(ObjectType::VirtualService, name, "bookinfo")
    }

    #[test]
    fn test_distinct_hosts_no_findings() {
        let out = run(&[
            service("reviews", "bookinfo", &["reviews"], &[]),
            service("ratings", "bookinfo", &["ratings"], &[]),
        ]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_later_object_is_flagged_as_warning() {
        let out = run(&[
            service("vs-b", "bookinfo", &["reviews.bookinfo.svc.cluster.local"], &[]),
            service("vs-a", "bookinfo", &["reviews"], &[]),
        ]);
        let flagged = out.get(&key("vs-b")).unwrap();
        assert!(flagged.valid);
        assert_eq!(flagged.checks.len(), 1);
        assert_eq!(flagged.checks[0].severity, Severity::Warning);
        assert_eq!(flagged.checks[0].path, "spec/hosts[0]");
        assert_eq!(flagged.references, vec![key("vs-a")]);

        let earlier = out.get(&key("vs-a")).unwrap();
        assert!(earlier.checks.is_empty());
        assert_eq!(earlier.references, vec![key("vs-b")]);
    }

    #[test]
    fn test_wildcard_host_overlaps() {
        let out = run(&[
            service("a", "bookinfo", &["*"], &[]),
            service("b", "bookinfo", &["details"], &[]),
        ]);
        assert_eq!(out.get(&key("b")).unwrap().checks.len(), 1);
        assert!(out.get(&key("a")).unwrap().checks.is_empty());
    }

    #[test]
    fn test_disjoint_gateways_do_not_conflict() {
        let out = run(&[
            service("a", "bookinfo", &["reviews"], &["gw-a"]),
            service("b", "bookinfo", &["reviews"], &["gw-b"]),
        ]);
        assert!(out.is_empty());

        let out = run(&[
            service("a", "bookinfo", &["reviews"], &["gw-a", "mesh"]),
            service("b", "bookinfo", &["reviews"], &[]),
        ]);
        assert_eq!(out.get(&key("b")).unwrap().checks.len(), 1);
    }

    #[test]
    fn test_repeated_host_in_same_object_is_not_a_conflict() {
        let out = run(&[service("a", "bookinfo", &["reviews", "reviews"], &[])]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_same_name_other_namespace_is_distinct() {
        let out = run(&[
            service("reviews", "bookinfo", &["reviews"], &[]),
            service("reviews", "eshop", &["reviews"], &[]),
        ]);
        assert!(out.is_empty());
    }
}
