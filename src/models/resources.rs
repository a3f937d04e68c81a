//! Typed schema for the Istio and Kubernetes resources the engine reads.
//!
//! Resources are decoded once at the boundary into a tagged union keyed by
//! `kind`. Decoding is permissive: every spec field defaults when absent, and
//! list/map fields that carry the wrong shape decode to their empty default
//! instead of failing. A malformed list element becomes an empty element at
//! the same index so structural paths reported by checkers stay accurate.
//!
//! Weights and precedences stay raw (`serde_json::Value`) because a
//! non-numeric value is a finding, not a decode error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// Decode a field, falling back to its default when the shape is wrong.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Json::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Decode a list element by element, keeping indexes stable.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Json::deserialize(deserializer)?;
    let items = match value {
        Json::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

/// Decode an optional string, dropping non-string scalars.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Json::deserialize(deserializer)? {
        Json::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

pub type Labels = BTreeMap<String, String>;

/// Decode a label map entry by entry. Numbers and booleans are kept in their
/// string form; any other value drops only its own entry.
pub(crate) fn lenient_labels<'de, D>(deserializer: D) -> Result<Labels, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Json::deserialize(deserializer)? {
        Json::Object(entries) => entries,
        _ => return Ok(Labels::new()),
    };
    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| match value {
            Json::String(s) => Some((key, s)),
            Json::Number(n) => Some((key, n.to_string())),
            Json::Bool(b) => Some((key, b.to_string())),
            _ => None,
        })
        .collect())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub creation_timestamp: Option<String>,
    pub resource_version: Option<String>,
    #[serde(deserialize_with = "lenient_labels")]
    pub labels: Labels,
    #[serde(deserialize_with = "lenient_labels")]
    pub annotations: Labels,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind")]
/// Every resource kind the snapshot understands.
pub enum Resource {
    VirtualService(VirtualService),
    DestinationRule(DestinationRule),
    Gateway(Gateway),
    RouteRule(RouteRule),
    ServiceEntry(ServiceEntry),
    Sidecar(Sidecar),
    AuthorizationPolicy(AuthorizationPolicy),
    PeerAuthentication(PeerAuthentication),
    Pod(Pod),
    Service(Service),
    Namespace(Namespace),
}

macro_rules! resource {
    ($(#[$doc:meta])* $name:ident, $spec:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, Deserialize)]
        #[serde(default)]
        pub struct $name {
            pub metadata: ObjectMeta,
            #[serde(deserialize_with = "lenient")]
            pub spec: $spec,
        }

        impl $name {
            pub fn name(&self) -> &str {
                &self.metadata.name
            }

            pub fn namespace(&self) -> &str {
                &self.metadata.namespace
            }
        }
    };
}

resource!(VirtualService, VirtualServiceSpec);
resource!(DestinationRule, DestinationRuleSpec);
resource!(Gateway, GatewaySpec);
resource!(
    /// Legacy `config.istio.io` route rule.
    RouteRule,
    RouteRuleSpec
);
resource!(ServiceEntry, ServiceEntrySpec);
resource!(Sidecar, SidecarSpec);
resource!(AuthorizationPolicy, AuthorizationPolicySpec);
resource!(PeerAuthentication, PeerAuthenticationSpec);
resource!(Pod, PodSpec);
resource!(Service, ServiceSpec);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Namespace {
    pub metadata: ObjectMeta,
}

// ----- networking -----

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualServiceSpec {
    #[serde(deserialize_with = "lenient")]
    pub hosts: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub gateways: Vec<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub http: Vec<RouteTable>,
    #[serde(deserialize_with = "lenient_vec")]
    pub tls: Vec<RouteTable>,
    #[serde(deserialize_with = "lenient_vec")]
    pub tcp: Vec<RouteTable>,
}

impl VirtualServiceSpec {
    /// Route tables by protocol field name, in declaration order.
    pub fn route_tables(&self) -> [(&'static str, &[RouteTable]); 3] {
        [("http", &self.http), ("tls", &self.tls), ("tcp", &self.tcp)]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    #[serde(deserialize_with = "lenient_vec")]
    pub route: Vec<RouteDestination>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteDestination {
    #[serde(deserialize_with = "lenient")]
    pub destination: Option<Destination>,
    pub weight: Option<Json>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Destination {
    #[serde(deserialize_with = "lenient_string")]
    pub host: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub subset: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DestinationRuleSpec {
    #[serde(deserialize_with = "lenient_string")]
    pub host: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub subsets: Vec<Subset>,
    #[serde(deserialize_with = "lenient")]
    pub traffic_policy: Option<TrafficPolicy>,
}

impl DestinationRuleSpec {
    pub fn subset(&self, name: &str) -> Option<&Subset> {
        self.subsets.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrafficPolicy {
    #[serde(deserialize_with = "lenient")]
    pub tls: Option<TlsSettings>,
    #[serde(deserialize_with = "lenient_vec")]
    pub port_level_settings: Vec<PortTrafficPolicy>,
}

impl TrafficPolicy {
    /// TLS mode set at top level.
    pub fn tls_mode(&self) -> Option<&str> {
        self.tls.as_ref().and_then(|t| t.mode.as_deref())
    }

    /// True when any TLS mode is set, at top level or for a port.
    pub fn has_tls(&self) -> bool {
        self.tls_mode().is_some()
            || self
                .port_level_settings
                .iter()
                .any(|p| p.tls.as_ref().is_some_and(|t| t.mode.is_some()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PortTrafficPolicy {
    #[serde(deserialize_with = "lenient")]
    pub tls: Option<TlsSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    #[serde(deserialize_with = "lenient_string")]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Subset {
    pub name: String,
    #[serde(deserialize_with = "lenient_labels")]
    pub labels: Labels,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewaySpec {
    #[serde(deserialize_with = "lenient_labels")]
    pub selector: Labels,
    #[serde(deserialize_with = "lenient_vec")]
    pub servers: Vec<Server>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Server {
    #[serde(deserialize_with = "lenient")]
    pub port: Option<Port>,
    #[serde(deserialize_with = "lenient")]
    pub hosts: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Port {
    pub number: Option<u32>,
    pub name: Option<String>,
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteRuleSpec {
    #[serde(deserialize_with = "lenient")]
    pub destination: Option<RouteRuleDestination>,
    pub precedence: Option<Json>,
    #[serde(deserialize_with = "lenient_vec")]
    pub route: Vec<WeightedLabels>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteRuleDestination {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WeightedLabels {
    #[serde(deserialize_with = "lenient_labels")]
    pub labels: Labels,
    pub weight: Option<Json>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceEntrySpec {
    #[serde(deserialize_with = "lenient")]
    pub hosts: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SidecarSpec {
    #[serde(deserialize_with = "lenient")]
    pub workload_selector: Option<WorkloadSelector>,
    #[serde(deserialize_with = "lenient_vec")]
    pub egress: Vec<EgressListener>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkloadSelector {
    #[serde(deserialize_with = "lenient_labels")]
    pub labels: Labels,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EgressListener {
    #[serde(deserialize_with = "lenient")]
    pub hosts: Vec<String>,
}

// ----- security -----

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthorizationPolicySpec {
    #[serde(deserialize_with = "lenient")]
    pub selector: Option<LabelSelector>,
    #[serde(deserialize_with = "lenient_vec")]
    pub rules: Vec<AuthorizationRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelSelector {
    #[serde(deserialize_with = "lenient_labels")]
    pub match_labels: Labels,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthorizationRule {
    #[serde(deserialize_with = "lenient_vec")]
    pub from: Vec<RuleFrom>,
    #[serde(deserialize_with = "lenient_vec")]
    pub to: Vec<RuleTo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleFrom {
    #[serde(deserialize_with = "lenient")]
    pub source: Option<RuleSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleSource {
    #[serde(deserialize_with = "lenient")]
    pub namespaces: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleTo {
    #[serde(deserialize_with = "lenient")]
    pub operation: Option<RuleOperation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleOperation {
    #[serde(deserialize_with = "lenient")]
    pub hosts: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PeerAuthenticationSpec {
    #[serde(deserialize_with = "lenient")]
    pub selector: Option<LabelSelector>,
    #[serde(deserialize_with = "lenient")]
    pub mtls: Option<PeerMtls>,
}

impl PeerAuthenticationSpec {
    /// Applies to every workload of its namespace.
    pub fn is_namespace_wide(&self) -> bool {
        self.selector.as_ref().map_or(true, |s| s.match_labels.is_empty())
    }

    /// The mTLS mode, ignoring `UNSET`.
    pub fn mode(&self) -> Option<&str> {
        self.mtls
            .as_ref()
            .and_then(|m| m.mode.as_deref())
            .filter(|mode| *mode != "UNSET")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PeerMtls {
    #[serde(deserialize_with = "lenient_string")]
    pub mode: Option<String>,
}

// ----- core -----

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PodSpec {
    #[serde(deserialize_with = "lenient_vec")]
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Container {
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceSpec {
    #[serde(deserialize_with = "lenient_labels")]
    pub selector: Labels,
}

/// True when every selector label is present with the same value.
/// An empty selector matches nothing.
pub fn selector_matches(selector: &Labels, labels: &Labels) -> bool {
    !selector.is_empty() && selector.iter().all(|(k, v)| labels.get(k) == Some(v))
}
