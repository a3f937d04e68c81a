//! In-memory snapshot of the cluster objects a validation run evaluates.
//!
//! A snapshot is read-only for the whole run. It can be decoded from a YAML
//! stream (one resource per `---` document), from a `kind: List` wrapper with
//! `items`, or from a JSON file holding either form.

use crate::error::SnapshotError;
use crate::models::resources::{
    AuthorizationPolicy, DestinationRule, Gateway, Namespace, PeerAuthentication, Pod, Resource,
    RouteRule, Service, ServiceEntry, Sidecar, VirtualService,
};
use serde::Deserialize;
use serde_json::Value as Json;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const KNOWN_KINDS: [&str; 11] = [
    "VirtualService",
    "DestinationRule",
    "Gateway",
    "RouteRule",
    "ServiceEntry",
    "Sidecar",
    "AuthorizationPolicy",
    "PeerAuthentication",
    "Pod",
    "Service",
    "Namespace",
];

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub virtual_services: Vec<VirtualService>,
    pub destination_rules: Vec<DestinationRule>,
    pub gateways: Vec<Gateway>,
    pub route_rules: Vec<RouteRule>,
    pub service_entries: Vec<ServiceEntry>,
    pub sidecars: Vec<Sidecar>,
    pub authorization_policies: Vec<AuthorizationPolicy>,
    pub peer_authentications: Vec<PeerAuthentication>,
    pub pods: Vec<Pod>,
    pub services: Vec<Service>,
    pub declared_namespaces: Vec<Namespace>,
}

impl Snapshot {
    /// Load from a file; `.json` is decoded as JSON, anything else as YAML.
    pub fn from_path(path: &Path) -> Result<Snapshot, SnapshotError> {
        let data = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Snapshot::from_json_str(&data)
        } else {
            Snapshot::from_yaml_str(&data)
        }
    }

    pub fn from_yaml_str(data: &str) -> Result<Snapshot, SnapshotError> {
        let mut snapshot = Snapshot::default();
        for document in serde_yaml::Deserializer::from_str(data) {
            let value = Json::deserialize(document)?;
            snapshot.add_document(value);
        }
        Ok(snapshot)
    }

    pub fn from_json_str(data: &str) -> Result<Snapshot, SnapshotError> {
        let value: Json = serde_json::from_str(data)?;
        let mut snapshot = Snapshot::default();
        snapshot.add_document(value);
        Ok(snapshot)
    }

    fn add_document(&mut self, value: Json) {
        match value {
            Json::Null => {}
            Json::Array(items) => items.into_iter().for_each(|item| self.add_document(item)),
            Json::Object(mut obj) => {
                let kind = obj
                    .get("kind")
                    .and_then(Json::as_str)
                    .unwrap_or_default()
                    .to_string();
                if kind == "List" || kind.ends_with("List") {
                    if let Some(Json::Array(items)) = obj.remove("items") {
                        items.into_iter().for_each(|item| self.add_document(item));
                    }
                    return;
                }
                if !KNOWN_KINDS.contains(&kind.as_str()) {
                    debug!(kind = %kind, "skipping unsupported resource kind");
                    return;
                }
                match serde_json::from_value::<Resource>(Json::Object(obj)) {
                    Ok(resource) => self.push(resource),
                    Err(e) => warn!(kind = %kind, error = %e, "skipping undecodable resource"),
                }
            }
            other => debug!(value = %other, "skipping non-object document"),
        }
    }

    pub fn push(&mut self, resource: Resource) {
        match resource {
            Resource::VirtualService(r) => self.virtual_services.push(r),
            Resource::DestinationRule(r) => self.destination_rules.push(r),
            Resource::Gateway(r) => self.gateways.push(r),
            Resource::RouteRule(r) => self.route_rules.push(r),
            Resource::ServiceEntry(r) => self.service_entries.push(r),
            Resource::Sidecar(r) => self.sidecars.push(r),
            Resource::AuthorizationPolicy(r) => self.authorization_policies.push(r),
            Resource::PeerAuthentication(r) => self.peer_authentications.push(r),
            Resource::Pod(r) => self.pods.push(r),
            Resource::Service(r) => self.services.push(r),
            Resource::Namespace(r) => self.declared_namespaces.push(r),
        }
    }

    /// Namespaces declared explicitly or used by any object.
    pub fn namespaces(&self) -> BTreeSet<String> {
        let mut out: BTreeSet<String> = self
            .declared_namespaces
            .iter()
            .map(|n| n.metadata.name.clone())
            .collect();
        let used = self
            .virtual_services
            .iter()
            .map(|o| o.namespace())
            .chain(self.destination_rules.iter().map(|o| o.namespace()))
            .chain(self.gateways.iter().map(|o| o.namespace()))
            .chain(self.route_rules.iter().map(|o| o.namespace()))
            .chain(self.service_entries.iter().map(|o| o.namespace()))
            .chain(self.sidecars.iter().map(|o| o.namespace()))
            .chain(self.authorization_policies.iter().map(|o| o.namespace()))
            .chain(self.peer_authentications.iter().map(|o| o.namespace()))
            .chain(self.pods.iter().map(|o| o.namespace()))
            .chain(self.services.iter().map(|o| o.namespace()));
        out.extend(used.filter(|ns| !ns.is_empty()).map(str::to_string));
        out
    }

    /// Number of objects that receive a validation record.
    pub fn validated_object_count(&self) -> usize {
        self.virtual_services.len()
            + self.destination_rules.len()
            + self.gateways.len()
            + self.route_rules.len()
            + self.sidecars.len()
            + self.authorization_policies.len()
            + self.pods.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const STREAM: &str = r#"
apiVersion: networking.istio.io/v1alpha3
kind: VirtualService
metadata:
  name: reviews
  namespace: bookinfo
spec:
  hosts: [reviews]
---
apiVersion: v1
kind: Service
metadata:
  name: reviews
  namespace: bookinfo
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: reviews-v1
  namespace: bookinfo
---
apiVersion: v1
kind: Namespace
metadata:
  name: empty-ns
"#;

    #[test]
    fn test_yaml_stream_groups_by_kind() {
        let snap = Snapshot::from_yaml_str(STREAM).unwrap();
        assert_eq!(snap.virtual_services.len(), 1);
        assert_eq!(snap.services.len(), 1);
        assert_eq!(snap.declared_namespaces.len(), 1);
        let ns = snap.namespaces();
        assert!(ns.contains("bookinfo"));
        assert!(ns.contains("empty-ns"));
        assert_eq!(snap.validated_object_count(), 1);
    }

    #[test]
    fn test_json_list_wrapper() {
        let data = r#"{
  "kind": "List",
  "items": [
    {"kind": "Gateway", "metadata": {"name": "gw", "namespace": "istio-system"},
     "spec": {"selector": {"istio": "ingressgateway"}}},
    {"kind": "Pod", "metadata": {"name": "p", "namespace": "bookinfo"},
     "spec": {"containers": [{"name": "istio-proxy"}]}}
  ]
}"#;
        let dir = tempdir().unwrap();
        let path = dir.path().join("snap.json");
        let mut f = fs::File::create(&path).unwrap();
        write!(f, "{}", data).unwrap();
        let snap = Snapshot::from_path(&path).unwrap();
        assert_eq!(snap.gateways.len(), 1);
        assert_eq!(snap.pods.len(), 1);
        assert_eq!(snap.pods[0].spec.containers[0].name, "istio-proxy");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = Snapshot::from_path(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(Snapshot::from_yaml_str("kind: [unclosed").is_err());
    }
}
