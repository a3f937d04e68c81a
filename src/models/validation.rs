//! Validation output model: object identity keys, checks, records and
//! per-namespace summaries.

use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Kind of configuration object a validation record belongs to.
pub enum ObjectType {
    VirtualService,
    DestinationRule,
    Gateway,
    RouteRule,
    ServiceEntry,
    Sidecar,
    AuthorizationPolicy,
    Pod,
}

impl ObjectType {
    pub const ALL: [ObjectType; 8] = [
        ObjectType::VirtualService,
        ObjectType::DestinationRule,
        ObjectType::Gateway,
        ObjectType::RouteRule,
        ObjectType::ServiceEntry,
        ObjectType::Sidecar,
        ObjectType::AuthorizationPolicy,
        ObjectType::Pod,
    ];

    /// Lowercase singular name used in keys and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::VirtualService => "virtualservice",
            ObjectType::DestinationRule => "destinationrule",
            ObjectType::Gateway => "gateway",
            ObjectType::RouteRule => "routerule",
            ObjectType::ServiceEntry => "serviceentry",
            ObjectType::Sidecar => "sidecar",
            ObjectType::AuthorizationPolicy => "authorizationpolicy",
            ObjectType::Pod => "pod",
        }
    }

    /// Accepts singular or plural forms, case-insensitive.
    pub fn parse(s: &str) -> Option<ObjectType> {
        let lower = s.trim().to_ascii_lowercase();
        let singular = if let Some(stem) = lower.strip_suffix("ies") {
            format!("{}y", stem)
        } else if let Some(stem) = lower.strip_suffix('s') {
            stem.to_string()
        } else {
            lower.clone()
        };
        ObjectType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower || t.as_str() == singular)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ObjectType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
/// Identity of a validated object, unique per (type, name, namespace).
pub struct ConfigObjectRef {
    pub object_type: ObjectType,
    pub name: String,
    pub namespace: String,
}

impl ConfigObjectRef {
    pub fn new(object_type: ObjectType, name: &str, namespace: &str) -> Self {
        ConfigObjectRef {
            object_type,
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

impl fmt::Display for ConfigObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.object_type, self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
/// Importance of a check. Only `Error` invalidates an object.
pub enum Severity {
    Error,
    Warning,
    Unknown,
}

impl Severity {
    /// Maps a free-form level to a severity. Anything unrecognized is `Unknown`.
    pub fn parse(level: &str) -> Severity {
        match level.trim().to_ascii_lowercase().as_str() {
            "error" | "err" => Severity::Error,
            "warning" | "warn" => Severity::Warning,
            _ => Severity::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A single finding located by a structural path such as
/// `spec/http[0]/route[1]/destination`.
pub struct Check {
    pub code: &'static str,
    pub message: String,
    pub severity: Severity,
    pub path: String,
}

impl Check {
    /// Structural identity used when merging: code is not part of it.
    pub fn same_finding(&self, other: &Check) -> bool {
        self.path == other.path && self.severity == other.severity && self.message == other.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// All checks gathered for one object across every checker that saw it.
pub struct ValidationRecord {
    pub name: String,
    pub namespace: String,
    pub object_type: ObjectType,
    pub valid: bool,
    pub checks: Vec<Check>,
    pub references: Vec<ConfigObjectRef>,
}

impl ValidationRecord {
    pub fn new(key: &ConfigObjectRef, checks: Vec<Check>, valid: bool) -> Self {
        ValidationRecord {
            name: key.name.clone(),
            namespace: key.namespace.clone(),
            object_type: key.object_type,
            valid,
            checks,
            references: Vec::new(),
        }
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.checks.iter().filter(|c| c.severity == severity).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Error/warning totals over the records of one namespace.
pub struct ValidationSummary {
    pub namespace: String,
    pub errors: usize,
    pub warnings: usize,
    pub object_count: usize,
}

impl ValidationSummary {
    pub(crate) fn add(&mut self, record: &ValidationRecord) {
        self.errors += record.errors();
        self.warnings += record.warnings();
        self.object_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_type_parse_forms() {
        assert_eq!(
            ObjectType::parse("virtualservices"),
            Some(ObjectType::VirtualService)
        );
        assert_eq!(
            ObjectType::parse("DestinationRule"),
            Some(ObjectType::DestinationRule)
        );
        assert_eq!(
            ObjectType::parse("authorizationpolicies"),
            Some(ObjectType::AuthorizationPolicy)
        );
        assert_eq!(ObjectType::parse("pods"), Some(ObjectType::Pod));
        assert_eq!(ObjectType::parse("gateway"), Some(ObjectType::Gateway));
        assert_eq!(ObjectType::parse("deployment"), None);
    }

    #[test]
    fn test_severity_fallback_is_unknown() {
        assert_eq!(Severity::parse("error"), Severity::Error);
        assert_eq!(Severity::parse(" Warn "), Severity::Warning);
        assert_eq!(Severity::parse("eror"), Severity::Unknown);
        assert_eq!(Severity::parse(""), Severity::Unknown);
    }

    #[test]
    fn test_check_serializes_with_lowercase_severity() {
        let check = Check {
            code: "KIA1101",
            message: "m".into(),
            severity: Severity::Warning,
            path: "spec/hosts[0]".into(),
        };
        let v = serde_json::to_value(&check).unwrap();
        assert_eq!(v["severity"], "warning");
        assert_eq!(v["path"], "spec/hosts[0]");
        assert_eq!(v["message"], "m");
    }
}
