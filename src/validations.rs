//! Keyed validation results and the merge protocol that combines partial
//! results from independent checkers.
//!
//! - `ValidationSet`: map from object identity to its record. Merging
//!   accumulates, it never overwrites: checks are unioned on
//!   `(path, severity, message)`, validity is AND-ed, references are unioned.
//! - `Aggregator`: the single writer used while a run is in progress.
//! - `ValidationReport`: the immutable result handed out by
//!   `Aggregator::finalize`.

use crate::checks::{is_valid, CheckKind};
use crate::models::{
    Check, ConfigObjectRef, ObjectType, Severity, ValidationRecord, ValidationSummary,
};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSet {
    records: BTreeMap<ConfigObjectRef, ValidationRecord>,
}

impl ValidationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding exactly one record.
    pub fn single(key: ConfigObjectRef, checks: Vec<Check>, valid: bool) -> Self {
        let mut set = Self::new();
        let record = ValidationRecord::new(&key, checks, valid);
        set.records.insert(key, record);
        set
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &ConfigObjectRef) -> Option<&ValidationRecord> {
        self.records.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConfigObjectRef, &ValidationRecord)> {
        self.records.iter()
    }

    pub fn records(&self) -> impl Iterator<Item = &ValidationRecord> {
        self.records.values()
    }

    /// Fetch or create the record for `key`, valid and empty by default.
    pub(crate) fn entry(&mut self, key: &ConfigObjectRef) -> &mut ValidationRecord {
        self.records
            .entry(key.clone())
            .or_insert_with(|| ValidationRecord::new(key, Vec::new(), true))
    }

    /// Fold `other` into `self` and return `self` for chaining.
    pub fn merge(&mut self, other: ValidationSet) -> &mut Self {
        for (key, incoming) in other.records {
            match self.records.get_mut(&key) {
                None => {
                    self.records.insert(key, incoming);
                }
                Some(existing) => merge_record(existing, incoming),
            }
        }
        self
    }

    /// Records of exactly this type and name.
    pub fn filter_by_key(&self, object_type: ObjectType, name: &str) -> ValidationSet {
        self.filtered(|k| k.object_type == object_type && k.name == name)
    }

    /// Other types pass untouched; for `object_type` only `name` survives.
    pub fn filter_by_single_type(&self, object_type: ObjectType, name: &str) -> ValidationSet {
        self.filtered(|k| k.object_type != object_type || k.name == name)
    }

    pub fn filter_by_types(&self, types: &[ObjectType]) -> ValidationSet {
        let wanted: HashSet<ObjectType> = types.iter().copied().collect();
        self.filtered(|k| wanted.contains(&k.object_type))
    }

    pub fn filter_by_namespace(&self, namespace: &str) -> ValidationSet {
        self.filtered(|k| k.namespace == namespace)
    }

    fn filtered(&self, keep: impl Fn(&ConfigObjectRef) -> bool) -> ValidationSet {
        ValidationSet {
            records: self
                .records
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Count checks by severity over the records of `namespace`; each record
    /// adds one to the object count whatever it carries.
    pub fn summarize(&self, namespace: &str) -> ValidationSummary {
        let mut summary = ValidationSummary {
            namespace: namespace.to_string(),
            ..Default::default()
        };
        for record in self.records.values().filter(|r| r.namespace == namespace) {
            summary.add(record);
        }
        summary
    }

    pub fn namespaces(&self) -> BTreeSet<&str> {
        self.records.keys().map(|k| k.namespace.as_str()).collect()
    }

    pub fn error_count(&self) -> usize {
        self.records.values().map(ValidationRecord::errors).sum()
    }
}

fn merge_record(existing: &mut ValidationRecord, incoming: ValidationRecord) {
    for check in incoming.checks {
        if !existing.checks.iter().any(|c| c.same_finding(&check)) {
            existing.checks.push(check);
        }
    }
    existing.valid = existing.valid && incoming.valid;
    for reference in incoming.references {
        if !existing.references.contains(&reference) {
            existing.references.push(reference);
        }
    }
}

impl FromIterator<ValidationSet> for ValidationSet {
    fn from_iter<I: IntoIterator<Item = ValidationSet>>(iter: I) -> Self {
        let mut total = ValidationSet::new();
        for partial in iter {
            total.merge(partial);
        }
        total
    }
}

/// `{objectType: {name: record}}`. Narrow to one namespace first when names
/// may repeat across namespaces.
impl Serialize for ValidationSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut grouped: BTreeMap<&str, BTreeMap<&str, &ValidationRecord>> = BTreeMap::new();
        for (key, record) in &self.records {
            grouped
                .entry(key.object_type.as_str())
                .or_default()
                .insert(key.name.as_str(), record);
        }
        let mut map = serializer.serialize_map(Some(grouped.len()))?;
        for (object_type, by_name) in grouped {
            map.serialize_entry(object_type, &by_name)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default)]
/// Post-processing applied when a run is finalized.
pub struct ReportPolicy {
    /// Check codes removed from every record.
    pub ignore: HashSet<String>,
    /// Severity replacements keyed by check code.
    pub severity: HashMap<String, Severity>,
}

impl ReportPolicy {
    pub fn is_noop(&self) -> bool {
        self.ignore.is_empty() && self.severity.is_empty()
    }

    /// Build from raw config values; unknown codes are kept as-is since they
    /// may belong to a newer catalog.
    pub fn from_config(ignore: &[String], severity: &HashMap<String, String>) -> Self {
        for code in ignore.iter().chain(severity.keys()) {
            if CheckKind::from_code(code).is_none() {
                tracing::warn!(code = %code, "configured check code is not in the catalog");
            }
        }
        ReportPolicy {
            ignore: ignore.iter().cloned().collect(),
            severity: severity
                .iter()
                .map(|(code, level)| (code.clone(), Severity::parse(level)))
                .collect(),
        }
    }

    fn apply(&self, record: &mut ValidationRecord) {
        let before = record.checks.len();
        record.checks.retain(|c| !self.ignore.contains(c.code));
        if before != record.checks.len() {
            tracing::trace!(
                object = %record.name,
                namespace = %record.namespace,
                stripped = before - record.checks.len(),
                "ignoring configured check codes"
            );
        }
        for check in record.checks.iter_mut() {
            if let Some(sev) = self.severity.get(check.code) {
                check.severity = *sev;
            }
        }
        record.valid = is_valid(&record.checks);
    }
}

#[derive(Debug, Default)]
/// Single-writer accumulator for one validation run.
pub struct Aggregator {
    validations: ValidationSet,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, partial: ValidationSet) {
        self.validations.merge(partial);
    }

    pub fn len(&self) -> usize {
        self.validations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validations.is_empty()
    }

    /// Close the run. Ignored codes are stripped, severity overrides applied
    /// and validity recomputed from what remains.
    pub fn finalize(self, policy: &ReportPolicy) -> ValidationReport {
        let mut validations = self.validations;
        if !policy.is_noop() {
            for record in validations.records.values_mut() {
                policy.apply(record);
            }
        }
        ValidationReport { validations }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable outcome of a run.
pub struct ValidationReport {
    validations: ValidationSet,
}

impl ValidationReport {
    pub fn validations(&self) -> &ValidationSet {
        &self.validations
    }

    pub fn into_validations(self) -> ValidationSet {
        self.validations
    }

    pub fn summarize(&self, namespace: &str) -> ValidationSummary {
        self.validations.summarize(namespace)
    }

    /// One summary per namespace present in the report.
    pub fn summaries(&self) -> BTreeMap<String, ValidationSummary> {
        self.validations
            .namespaces()
            .into_iter()
            .map(|ns| (ns.to_string(), self.validations.summarize(ns)))
            .collect()
    }

    /// Narrow the report to one namespace.
    pub fn for_namespace(&self, namespace: &str) -> ValidationReport {
        ValidationReport {
            validations: self.validations.filter_by_namespace(namespace),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.validations.error_count() > 0
    }
}

/// `{validations: {namespace: {objectType: {name: record}}}, summaries: {...}}`
impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let by_namespace: BTreeMap<&str, ValidationSet> = self
            .validations
            .namespaces()
            .into_iter()
            .map(|ns| (ns, self.validations.filter_by_namespace(ns)))
            .collect();
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("validations", &by_namespace)?;
        map.serialize_entry("summaries", &self.summaries())?;
        map.end()
    }
}
