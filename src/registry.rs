//! Known destinations derived from a snapshot: services, service-entry hosts,
//! gateways and namespaces. Built once per run and shared read-only by the
//! checkers.

use crate::host::{dns_matches, Host};
use crate::snapshot::Snapshot;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    cluster_domain: String,
    services: Vec<Host>,
    service_entry_hosts: Vec<String>,
    namespaces: BTreeSet<String>,
}

impl ServiceRegistry {
    pub fn from_snapshot(snapshot: &Snapshot, cluster_domain: &str) -> Self {
        ServiceRegistry {
            cluster_domain: cluster_domain.to_string(),
            services: snapshot
                .services
                .iter()
                .map(|s| Host::parse(s.name(), s.namespace(), cluster_domain))
                .collect(),
            service_entry_hosts: snapshot
                .service_entries
                .iter()
                .flat_map(|se| se.spec.hosts.iter().cloned())
                .collect(),
            namespaces: snapshot.namespaces(),
        }
    }

    /// Registry from bare service names in one namespace.
    pub fn with_services(namespace: &str, names: &[&str], cluster_domain: &str) -> Self {
        ServiceRegistry {
            cluster_domain: cluster_domain.to_string(),
            services: names
                .iter()
                .map(|n| Host::parse(n, namespace, cluster_domain))
                .collect(),
            service_entry_hosts: Vec::new(),
            namespaces: std::iter::once(namespace.to_string()).collect(),
        }
    }

    pub fn add_service_entry_host(&mut self, host: &str) {
        self.service_entry_hosts.push(host.to_string());
    }

    pub fn cluster_domain(&self) -> &str {
        &self.cluster_domain
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }

    pub fn parse(&self, hostname: &str, namespace: &str) -> Host {
        Host::parse(hostname, namespace, &self.cluster_domain)
    }

    /// True when `hostname`, read from an object in `namespace`, names at
    /// least one known service or service-entry host.
    pub fn resolves(&self, hostname: &str, namespace: &str) -> bool {
        let host = self.parse(hostname, namespace);
        if self.services.iter().any(|svc| host.covers(svc)) {
            return true;
        }
        if hostname.starts_with("*.")
            && self
                .services
                .iter()
                .any(|svc| dns_matches(hostname, &svc.to_string()))
        {
            return true;
        }
        self.service_entry_hosts
            .iter()
            .any(|se| dns_matches(se, hostname) || dns_matches(hostname, se))
    }

    /// Service hosts that `host` covers.
    pub fn matching_services<'a>(&'a self, host: &'a Host) -> impl Iterator<Item = &'a Host> {
        self.services.iter().filter(move |svc| host.covers(svc))
    }
}
