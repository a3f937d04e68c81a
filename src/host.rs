//! Hostname normalization and wildcard-aware matching.
//!
//! Any hostname found in a routing object is turned into a
//! `(service, namespace, cluster)` triple relative to the namespace the object
//! lives in:
//! - `reviews` takes the context namespace and cluster domain.
//! - `reviews.bookinfo` supplies its namespace.
//! - `reviews.bookinfo.svc.cluster.local` supplies everything, so the context
//!   is ignored.
//! - `*` is the universal wildcard.

use std::fmt;

pub const WILDCARD: &str = "*";
pub const DEFAULT_CLUSTER_DOMAIN: &str = "svc.cluster.local";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Host {
    pub service: String,
    pub namespace: String,
    pub cluster: String,
}

impl Host {
    pub fn wildcard() -> Host {
        Host {
            service: WILDCARD.into(),
            namespace: WILDCARD.into(),
            cluster: WILDCARD.into(),
        }
    }

    /// Normalize `hostname` relative to the object's namespace and cluster.
    pub fn parse(hostname: &str, namespace: &str, cluster: &str) -> Host {
        let hostname = hostname.trim();
        if hostname == WILDCARD {
            return Host::wildcard();
        }
        let mut parts = hostname.splitn(3, '.');
        let service = parts.next().unwrap_or_default();
        match (parts.next(), parts.next()) {
            (None, _) => Host::new(service, namespace, cluster),
            (Some(ns), None) => Host::new(service, ns, cluster),
            (Some(ns), Some(rest)) => Host::new(service, ns, rest),
        }
    }

    fn new(service: &str, namespace: &str, cluster: &str) -> Host {
        Host {
            service: service.to_string(),
            namespace: namespace.to_string(),
            cluster: cluster.to_string(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.service == WILDCARD && self.namespace == WILDCARD && self.cluster == WILDCARD
    }

    /// True when every component of `other` falls under this host, treating
    /// `*` components of `self` as covering anything.
    pub fn covers(&self, other: &Host) -> bool {
        self.is_wildcard()
            || (covers_component(&self.cluster, &other.cluster)
                && covers_component(&self.namespace, &other.namespace)
                && covers_component(&self.service, &other.service))
    }

    /// Equal, or one of the two subsumes the other.
    pub fn matches(&self, other: &Host) -> bool {
        self.covers(other) || other.covers(self)
    }
}

pub(crate) fn covers_component(pattern: &str, value: &str) -> bool {
    pattern == WILDCARD || pattern == value
}

/// Symmetric component match used when probing presence maps.
pub(crate) fn component_overlaps(a: &str, b: &str) -> bool {
    covers_component(a, b) || covers_component(b, a)
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.service, self.namespace, self.cluster)
    }
}

/// Match a raw hostname against a service-entry style host, which may carry
/// a leading `*.` wildcard label.
pub fn dns_matches(pattern: &str, hostname: &str) -> bool {
    if pattern == hostname || pattern == WILDCARD {
        return true;
    }
    match pattern.strip_prefix("*.") {
        Some(suffix) => hostname.len() > suffix.len() && hostname.ends_with(&format!(".{}", suffix)),
        None => false,
    }
}
