//! Detects Gateways whose servers claim the same host on the same port for
//! the same workload selector.

use crate::checkers::presence::flag_collision;
use crate::checkers::{by_namespace_and_name, GroupChecker};
use crate::checks::CheckKind;
use crate::host::dns_matches;
use crate::models::resources::{Gateway, Labels};
use crate::models::{ConfigObjectRef, ObjectType};
use crate::validations::ValidationSet;
use std::collections::BTreeSet;

pub struct MultiMatchChecker<'a> {
    pub gateways: &'a [Gateway],
}

struct Claim<'a> {
    owner: ConfigObjectRef,
    port: u32,
    selector: &'a Labels,
    host: &'a str,
}

/// Server hosts may carry a `namespace/` prefix; only the DNS part counts.
fn dns_part(host: &str) -> &str {
    host.split_once('/').map_or(host, |(_, h)| h)
}

impl GroupChecker for MultiMatchChecker<'_> {
    fn name(&self) -> &'static str {
        "gateway_multi_match"
    }

    fn check(&self) -> ValidationSet {
        let mut ordered: Vec<&Gateway> = self.gateways.iter().collect();
        ordered.sort_by(|a, b| by_namespace_and_name(&a.metadata, &b.metadata));

        let mut claims: Vec<Claim> = Vec::new();
        let mut out = ValidationSet::new();

        for gw in ordered {
            let key = ConfigObjectRef::new(ObjectType::Gateway, gw.name(), gw.namespace());
            let mut own = Vec::new();
            for (i, server) in gw.spec.servers.iter().enumerate() {
                let Some(port) = server.port.as_ref().and_then(|p| p.number) else {
                    continue;
                };
                for (j, host) in server.hosts.iter().enumerate() {
                    let host = dns_part(host);
                    let others: BTreeSet<ConfigObjectRef> = claims
                        .iter()
                        .filter(|c| {
                            c.port == port
                                && c.selector == &gw.spec.selector
                                && (dns_matches(c.host, host) || dns_matches(host, c.host))
                        })
                        .map(|c| c.owner.clone())
                        .collect();
                    if !others.is_empty() {
                        let check = CheckKind::GatewayMultiMatch.at(format!("spec/servers[{}]/hosts[{}]", i, j));
                        flag_collision(&mut out, &key, &others, check);
                    }
                    own.push(Claim {
                        owner: key.clone(),
                        port,
                        selector: &gw.spec.selector,
                        host,
                    });
                }
            }
            // servers of one gateway never collide with each other
            claims.extend(own);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::fixtures::object;

    fn gateway(namespace: &str, name: &str, port: u32, hosts: &[&str]) -> Gateway {
        object(&format!(
            "metadata: {{name: {}, namespace: {}}}\nspec:\n  selector: {{istio: ingressgateway}}\n  servers:\n    - port: {{number: {}, name: http, protocol: HTTP}}\n      hosts: [{}]\n",
            name,
            namespace,
            port,
            hosts.iter().map(|h| format!("\"{}\"", h)).collect::<Vec<_>>().join(", ")
        ))
    }

    fn key(namespace: &str, name: &str) -> ConfigObjectRef {
        ConfigObjectRef::new(ObjectType::Gateway, name, namespace)
    }

    fn run(gateways: &[Gateway]) -> ValidationSet {
        MultiMatchChecker { gateways }.check()
    }

    #[test]
    fn test_same_host_and_port_flags_later_gateway() {
        let out = run(&[
            gateway("bookinfo", "gw-b", 80, &["reviews.example.com"]),
            gateway("bookinfo", "gw-a", 80, &["reviews.example.com"]),
        ]);
        let flagged = out.get(&key("bookinfo", "gw-b")).unwrap();
        assert!(flagged.valid);
        assert_eq!(flagged.checks.len(), 1);
        assert_eq!(flagged.checks[0].path, "spec/servers[0]/hosts[0]");
        assert_eq!(flagged.references, vec![key("bookinfo", "gw-a")]);
        assert!(out.get(&key("bookinfo", "gw-a")).unwrap().checks.is_empty());
    }

    #[test]
    fn test_wildcard_host_overlaps() {
        let out = run(&[
            gateway("bookinfo", "a", 443, &["*.example.com"]),
            gateway("istio-system", "b", 443, &["bookinfo/api.example.com"]),
        ]);
        assert_eq!(out.get(&key("istio-system", "b")).unwrap().checks.len(), 1);
    }

    #[test]
    fn test_different_port_or_host_is_fine() {
        assert!(run(&[
            gateway("bookinfo", "a", 80, &["reviews.example.com"]),
            gateway("bookinfo", "b", 8080, &["reviews.example.com"]),
        ])
        .is_empty());
        assert!(run(&[
            gateway("bookinfo", "a", 80, &["reviews.example.com"]),
            gateway("bookinfo", "b", 80, &["ratings.example.com"]),
        ])
        .is_empty());
    }

    #[test]
    fn test_one_gateway_repeating_a_host_is_fine() {
        assert!(run(&[gateway("bookinfo", "a", 80, &["x.example.com", "x.example.com"])]).is_empty());
    }
}
