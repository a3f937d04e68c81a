//! Detects DestinationRules that overlap on host.
//!
//! Two rules for overlapping hosts collide unless both declare subsets and
//! no subset name is shared. The later rule in (namespace, name) order gets
//! the warning; validity is untouched.

use crate::checkers::presence::{flag_collision, HostPresence};
use crate::checkers::{by_namespace_and_name, GroupChecker};
use crate::checks::CheckKind;
use crate::host::Host;
use crate::models::resources::DestinationRule;
use crate::models::{ConfigObjectRef, ObjectType};
use crate::validations::ValidationSet;
use std::collections::BTreeSet;

pub struct MultiMatchChecker<'a> {
    pub cluster_domain: &'a str,
    pub destination_rules: &'a [DestinationRule],
}

struct Claim {
    owner: ConfigObjectRef,
    subsets: BTreeSet<String>,
}

fn collides(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    a.is_empty() || b.is_empty() || !a.is_disjoint(b)
}

impl GroupChecker for MultiMatchChecker<'_> {
    fn name(&self) -> &'static str {
        "destinationrule_multi_match"
    }

    fn check(&self) -> ValidationSet {
        let mut ordered: Vec<&DestinationRule> = self.destination_rules.iter().collect();
        ordered.sort_by(|a, b| by_namespace_and_name(&a.metadata, &b.metadata));

        let mut presence: HostPresence<Claim> = HostPresence::new();
        let mut out = ValidationSet::new();

        for rule in ordered {
            let Some(hostname) = rule.spec.host.as_deref() else {
                continue;
            };
            let key = ConfigObjectRef::new(ObjectType::DestinationRule, rule.name(), rule.namespace());
            let host = Host::parse(hostname, rule.namespace(), self.cluster_domain);
            let subsets: BTreeSet<String> = rule.spec.subsets.iter().map(|s| s.name.clone()).collect();

            let others: BTreeSet<ConfigObjectRef> = presence
                .overlapping(&host)
                .filter(|c| c.owner != key && collides(&c.subsets, &subsets))
                .map(|c| c.owner.clone())
                .collect();
            if !others.is_empty() {
                flag_collision(&mut out, &key, &others, CheckKind::DestinationRuleMultiMatch.at("spec/host"));
            }
            presence.insert(&host, Claim { owner: key, subsets });
        }
        out
    }
}
