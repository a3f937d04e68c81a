//! Checkers for VirtualServices.

mod no_gateway;
mod no_host;
mod route;
mod single_host;
mod subset_presence;
mod version_presence;

pub use no_gateway::NoGatewayChecker;
pub use no_host::NoHostChecker;
pub use route::RouteChecker;
pub use single_host::SingleHostChecker;
pub use subset_presence::SubsetPresenceChecker;
pub use version_presence::VersionPresenceChecker;

use crate::host::Host;
use crate::models::resources::{DestinationRule, RouteDestination, Subset, VirtualService};

pub const MESH_GATEWAY: &str = "mesh";

/// Every weighted destination with its route entry path, e.g.
/// `spec/http[0]/route[1]`.
pub(crate) fn route_destinations(
    vs: &VirtualService,
) -> impl Iterator<Item = (String, &RouteDestination)> {
    vs.spec
        .route_tables()
        .into_iter()
        .flat_map(|(protocol, tables)| {
            tables.iter().enumerate().flat_map(move |(i, table)| {
                table
                    .route
                    .iter()
                    .enumerate()
                    .map(move |(j, dw)| (format!("spec/{}[{}]/route[{}]", protocol, i, j), dw))
            })
        })
}

/// The labelled subset `name` of the first destination rule whose host
/// covers `host`.
pub(crate) fn find_subset<'a>(
    destination_rules: &'a [DestinationRule],
    host: &Host,
    subset: &str,
    cluster_domain: &str,
) -> Option<(&'a DestinationRule, &'a Subset)> {
    destination_rules.iter().find_map(|dr| {
        let dr_host = Host::parse(dr.spec.host.as_deref()?, dr.namespace(), cluster_domain);
        if !dr_host.covers(host) {
            return None;
        }
        dr.spec
            .subset(subset)
            .filter(|s| !s.labels.is_empty())
            .map(|s| (dr, s))
    })
}

/// Normalized gateway reference. Accepts `name`, `namespace/name` and FQDN
/// forms; `mesh` stays as is.
pub(crate) fn gateway_ref(reference: &str, namespace: &str, cluster_domain: &str) -> String {
    if reference == MESH_GATEWAY {
        return MESH_GATEWAY.to_string();
    }
    match reference.split_once('/') {
        Some((ns, name)) => {
            let ns = if ns.is_empty() || ns == "." { namespace } else { ns };
            Host::parse(name, ns, cluster_domain).to_string()
        }
        None => Host::parse(reference, namespace, cluster_domain).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::checkers::fixtures::vs;
    use super::*;
    use crate::host::DEFAULT_CLUSTER_DOMAIN;

    #[test]
    fn test_route_destinations_paths() {
        let v = vs(r#"
metadata: {name: reviews, namespace: bookinfo}
spec:
  http:
    - route:
        - destination: {host: reviews, subset: v1}
        - destination: {host: reviews, subset: v2}
  tcp:
    - route:
        - destination: {host: ratings}
"#);
        let paths: Vec<String> = route_destinations(&v).map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            vec![
                "spec/http[0]/route[0]",
                "spec/http[0]/route[1]",
                "spec/tcp[0]/route[0]"
            ]
        );
    }

    #[test]
    fn test_gateway_ref_forms() {
        let d = DEFAULT_CLUSTER_DOMAIN;
        assert_eq!(gateway_ref("mesh", "bookinfo", d), "mesh");
        assert_eq!(
            gateway_ref("my-gateway", "bookinfo", d),
            "my-gateway.bookinfo.svc.cluster.local"
        );
        assert_eq!(
            gateway_ref("istio-system/ingress", "bookinfo", d),
            "ingress.istio-system.svc.cluster.local"
        );
        assert_eq!(
            gateway_ref("./ingress", "bookinfo", d),
            "ingress.bookinfo.svc.cluster.local"
        );
        assert_eq!(
            gateway_ref("ingress.istio-system.svc.cluster.local", "bookinfo", d),
            "ingress.istio-system.svc.cluster.local"
        );
    }
}
