//! Gateways referenced by a VirtualService must exist.

use super::{gateway_ref, MESH_GATEWAY};
use crate::checkers::Checker;
use crate::checks::{is_valid, CheckKind};
use crate::models::resources::VirtualService;
use crate::models::Check;
use std::collections::HashSet;

pub struct NoGatewayChecker<'a> {
    pub namespace: &'a str,
    pub cluster_domain: &'a str,
    /// Known gateways, already normalized with [`gateway_ref`].
    pub gateway_names: &'a HashSet<String>,
    pub virtual_service: &'a VirtualService,
}

impl Checker for NoGatewayChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        for (i, gateway) in self.virtual_service.spec.gateways.iter().enumerate() {
            if gateway == MESH_GATEWAY {
                continue;
            }
            let reference = gateway_ref(gateway, self.namespace, self.cluster_domain);
            if !self.gateway_names.contains(&reference) {
                checks.push(CheckKind::VirtualServiceGatewayNotFound.at(format!("spec/gateways[{}]", i)));
            }
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::fixtures::vs;
    use crate::host::DEFAULT_CLUSTER_DOMAIN;
    use crate::models::Severity;

    const VS: &str = r#"
metadata: {name: reviews, namespace: bookinfo}
spec:
  hosts: [reviews]
  gateways: [my-gateway, mesh]
"#;

    fn run(v: &VirtualService, gateways: &HashSet<String>) -> (Vec<Check>, bool) {
        NoGatewayChecker {
            namespace: "bookinfo",
            cluster_domain: DEFAULT_CLUSTER_DOMAIN,
            gateway_names: gateways,
            virtual_service: v,
        }
        .check()
    }

    #[test]
    fn test_missing_gateway_is_error() {
        let v = vs(VS);
        let (checks, valid) = run(&v, &HashSet::new());
        assert!(!valid);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].severity, Severity::Error);
        assert_eq!(checks[0].path, "spec/gateways[0]");
    }

    #[test]
    fn test_known_gateway_and_mesh_are_valid() {
        let v = vs(VS);
        let known: HashSet<String> =
            [gateway_ref("my-gateway", "bookinfo", DEFAULT_CLUSTER_DOMAIN)].into_iter().collect();
        let (checks, valid) = run(&v, &known);
        assert!(checks.is_empty());
        assert!(valid);
    }

    #[test]
    fn test_namespaced_reference_matches_other_namespace() {
        let v = vs(r#"
metadata: {name: reviews, namespace: bookinfo}
spec:
  gateways: [istio-system/ingress, ingress]
"#);
        let known: HashSet<String> =
            [gateway_ref("ingress", "istio-system", DEFAULT_CLUSTER_DOMAIN)].into_iter().collect();
        let (checks, valid) = run(&v, &known);
        assert!(!valid);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].path, "spec/gateways[1]");
    }
}
