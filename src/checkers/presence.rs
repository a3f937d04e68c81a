//! Cluster -> namespace -> service presence map shared by the group checkers
//! that detect overlapping host ownership.

use crate::host::{component_overlaps, Host};
use crate::models::{Check, ConfigObjectRef};
use crate::validations::ValidationSet;
use std::collections::BTreeMap;

pub(crate) struct HostPresence<T> {
    clusters: BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<T>>>>,
}

impl<T> HostPresence<T> {
    pub fn new() -> Self {
        HostPresence {
            clusters: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, host: &Host, value: T) {
        self.clusters
            .entry(host.cluster.clone())
            .or_default()
            .entry(host.namespace.clone())
            .or_default()
            .entry(host.service.clone())
            .or_default()
            .push(value);
    }

    /// Values recorded under any host that overlaps `host`; `*` at a level
    /// overlaps every key on that level, in either direction.
    pub fn overlapping<'m>(&'m self, host: &'m Host) -> impl Iterator<Item = &'m T> {
        self.clusters
            .iter()
            .filter(move |(cluster, _)| component_overlaps(cluster, &host.cluster))
            .flat_map(|(_, namespaces)| namespaces.iter())
            .filter(move |(namespace, _)| component_overlaps(namespace, &host.namespace))
            .flat_map(|(_, services)| services.iter())
            .filter(move |(service, _)| component_overlaps(service, &host.service))
            .flat_map(|(_, values)| values.iter())
    }
}

/// Record `check` on `key`, link it to every object it collided with and
/// give each of those a back-reference.
pub(crate) fn flag_collision<'a, I>(out: &mut ValidationSet, key: &ConfigObjectRef, others: I, check: Check)
where
    I: IntoIterator<Item = &'a ConfigObjectRef>,
{
    let others: Vec<&ConfigObjectRef> = others.into_iter().collect();
    let record = out.entry(key);
    record.checks.push(check);
    for other in &others {
        if !record.references.contains(other) {
            record.references.push((*other).clone());
        }
    }
    for other in others {
        let earlier = out.entry(other);
        if !earlier.references.contains(key) {
            earlier.references.push(key.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DEFAULT_CLUSTER_DOMAIN;

    fn host(name: &str) -> Host {
        Host::parse(name, "bookinfo", DEFAULT_CLUSTER_DOMAIN)
    }

    #[test]
    fn test_overlapping_respects_wildcards() {
        let mut p = HostPresence::new();
        p.insert(&host("reviews"), 1);
        p.insert(&host("*.eshop.svc.cluster.local"), 2);
        p.insert(&host("ratings.bookinfo"), 3);

        let hits: Vec<i32> = p.overlapping(&host("reviews.bookinfo.svc.cluster.local")).copied().collect();
        assert_eq!(hits, vec![1]);
        let hits: Vec<i32> = p.overlapping(&host("cart.eshop")).copied().collect();
        assert_eq!(hits, vec![2]);
        assert_eq!(p.overlapping(&Host::wildcard()).count(), 3);
        assert_eq!(p.overlapping(&host("details")).count(), 0);
    }
}
