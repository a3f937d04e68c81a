//! Catalog of every finding the checkers can emit.
//!
//! Each `CheckKind` owns a stable code, a message and a default severity.
//! Checkers only pick a kind and a structural path; the text never varies.

use crate::models::{Check, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    // authorization policies
    AuthzSourceNamespaceNotFound,
    AuthzHostNotFound,
    AuthzHostNamespaceUnknown,
    // destination rules
    DestinationRuleMultiMatch,
    DestinationRuleHostNotFound,
    DestinationRuleSubsetLabelsNotFound,
    DestinationRuleSubsetNoLabels,
    DestinationRuleNoTlsSettings,
    DestinationRuleNamespaceStrictMtls,
    DestinationRuleMeshStrictMtls,
    // gateways
    GatewayMultiMatch,
    GatewaySelectorNoWorkload,
    // generic
    SelectorWorkloadNotFound,
    // route rules
    RouteRulePrecedenceNotNumber,
    RouteRulePrecedenceNegative,
    RouteRuleDestinationNotFound,
    // pods
    PodMissingSidecar,
    PodMissingAppLabel,
    PodMissingVersionLabel,
    // sidecars
    SidecarEgressHostNotFound,
    // route weights (virtual services and route rules)
    WeightNotNumber,
    WeightOutOfRange,
    WeightMissing,
    WeightSumNot100,
    // virtual services
    VirtualServiceHostNotFound,
    VirtualServiceGatewayNotFound,
    VirtualServiceSingleHost,
    VirtualServiceSubsetNotFound,
    VirtualServiceDestinationMandatory,
    VirtualServiceSubsetNoPods,
}

impl CheckKind {
    pub const ALL: [CheckKind; 30] = [
        CheckKind::AuthzSourceNamespaceNotFound,
        CheckKind::AuthzHostNotFound,
        CheckKind::AuthzHostNamespaceUnknown,
        CheckKind::DestinationRuleMultiMatch,
        CheckKind::DestinationRuleHostNotFound,
        CheckKind::DestinationRuleSubsetLabelsNotFound,
        CheckKind::DestinationRuleSubsetNoLabels,
        CheckKind::DestinationRuleNoTlsSettings,
        CheckKind::DestinationRuleNamespaceStrictMtls,
        CheckKind::DestinationRuleMeshStrictMtls,
        CheckKind::GatewayMultiMatch,
        CheckKind::GatewaySelectorNoWorkload,
        CheckKind::SelectorWorkloadNotFound,
        CheckKind::RouteRulePrecedenceNotNumber,
        CheckKind::RouteRulePrecedenceNegative,
        CheckKind::RouteRuleDestinationNotFound,
        CheckKind::PodMissingSidecar,
        CheckKind::PodMissingAppLabel,
        CheckKind::PodMissingVersionLabel,
        CheckKind::SidecarEgressHostNotFound,
        CheckKind::WeightNotNumber,
        CheckKind::WeightOutOfRange,
        CheckKind::WeightMissing,
        CheckKind::WeightSumNot100,
        CheckKind::VirtualServiceHostNotFound,
        CheckKind::VirtualServiceGatewayNotFound,
        CheckKind::VirtualServiceSingleHost,
        CheckKind::VirtualServiceSubsetNotFound,
        CheckKind::VirtualServiceDestinationMandatory,
        CheckKind::VirtualServiceSubsetNoPods,
    ];

    fn descriptor(&self) -> (&'static str, &'static str, Severity) {
        use CheckKind::*;
        use Severity::*;
        match self {
            AuthzSourceNamespaceNotFound => ("KIA0101", "Namespace not found for this rule", Warning),
            AuthzHostNotFound => (
                "KIA0104",
                "This host has no matching entry in the service registry",
                Error,
            ),
            AuthzHostNamespaceUnknown => (
                "KIA0108",
                "Namespace of this host is not part of the snapshot, the service registry cannot be verified",
                Unknown,
            ),
            DestinationRuleMultiMatch => (
                "KIA0201",
                "More than one DestinationRules for same host",
                Warning,
            ),
            DestinationRuleHostNotFound => (
                "KIA0202",
                "This host has no matching entry in the service registry (service, workload or service entries)",
                Error,
            ),
            DestinationRuleSubsetLabelsNotFound => (
                "KIA0203",
                "This subset's labels are not found in any matching host",
                Error,
            ),
            DestinationRuleSubsetNoLabels => ("KIA0209", "This subset has not labels", Warning),
            DestinationRuleNoTlsSettings => (
                "KIA0204",
                "mTLS settings of a non-local Destination Rule are overridden",
                Warning,
            ),
            DestinationRuleNamespaceStrictMtls => (
                "KIA0207",
                "PeerAuthentication with TLS strict mode found, it should be permissive",
                Error,
            ),
            DestinationRuleMeshStrictMtls => (
                "KIA0208",
                "PeerAuthentication enabling mTLS found, permissive policy is needed",
                Error,
            ),
            GatewayMultiMatch => (
                "KIA0301",
                "More than one Gateway for the same host port combination",
                Warning,
            ),
            GatewaySelectorNoWorkload => (
                "KIA0302",
                "No matching workload found for gateway selector in this namespace",
                Warning,
            ),
            SelectorWorkloadNotFound => (
                "KIA0004",
                "No matching workload found for the selector in this namespace",
                Warning,
            ),
            RouteRulePrecedenceNotNumber => ("KIA0801", "Precedence must be a number", Error),
            RouteRulePrecedenceNegative => (
                "KIA0802",
                "Precedence should be greater than or equal to 0",
                Error,
            ),
            RouteRuleDestinationNotFound => (
                "KIA0803",
                "Destination doesn't have a valid service (service name not found)",
                Error,
            ),
            PodMissingSidecar => ("KIA0901", "Pod has no Istio sidecar", Warning),
            PodMissingAppLabel => ("KIA0902", "Pod has no app label", Warning),
            PodMissingVersionLabel => ("KIA0903", "Pod has no version label", Warning),
            SidecarEgressHostNotFound => (
                "KIA1004",
                "This host has no matching entry in the service registry",
                Warning,
            ),
            WeightNotNumber => ("KIA1110", "Weight must be a number", Error),
            WeightOutOfRange => ("KIA1111", "Weight should be between 0 and 100", Error),
            WeightMissing => ("KIA1112", "All routes should have weight", Error),
            WeightSumNot100 => ("KIA1113", "Weight sum should be 100", Error),
            VirtualServiceHostNotFound => (
                "KIA1101",
                "DestinationWeight on route doesn't have a valid service (host not found)",
                Error,
            ),
            VirtualServiceGatewayNotFound => (
                "KIA1102",
                "VirtualService is pointing to a non-existent gateway",
                Error,
            ),
            VirtualServiceSingleHost => (
                "KIA1106",
                "More than one Virtual Service for same host",
                Warning,
            ),
            VirtualServiceSubsetNotFound => ("KIA1107", "Subset not found", Warning),
            VirtualServiceDestinationMandatory => {
                ("KIA1109", "Destination field is mandatory", Error)
            }
            VirtualServiceSubsetNoPods => (
                "KIA1114",
                "No pods found with the labels of this subset",
                Warning,
            ),
        }
    }

    pub fn code(&self) -> &'static str {
        self.descriptor().0
    }

    pub fn message(&self) -> &'static str {
        self.descriptor().1
    }

    pub fn severity(&self) -> Severity {
        self.descriptor().2
    }

    pub fn from_code(code: &str) -> Option<CheckKind> {
        CheckKind::ALL.into_iter().find(|k| k.code() == code)
    }

    /// Build a check of this kind located at `path`.
    pub fn at(&self, path: impl Into<String>) -> Check {
        let (code, message, severity) = self.descriptor();
        Check {
            code,
            message: message.to_string(),
            severity,
            path: path.into(),
        }
    }
}

/// Validity of an object given its checks: only errors invalidate.
pub fn is_valid(checks: &[Check]) -> bool {
    !checks.iter().any(|c| c.severity == Severity::Error)
}
