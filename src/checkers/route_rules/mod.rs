//! Checkers for legacy `config.istio.io` RouteRules.

use crate::checkers::weights::{check_weights, parse_integer};
use crate::checkers::Checker;
use crate::checks::{is_valid, CheckKind};
use crate::models::resources::RouteRule;
use crate::models::Check;
use crate::registry::ServiceRegistry;

/// A declared precedence must be a non-negative integer.
pub struct PrecedenceChecker<'a> {
    pub route_rule: &'a RouteRule,
}

impl Checker for PrecedenceChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        if let Some(raw) = self.route_rule.spec.precedence.as_ref() {
            match parse_integer(raw) {
                None => checks.push(CheckKind::RouteRulePrecedenceNotNumber.at("spec/precedence")),
                Some(p) if p < 0 => checks.push(CheckKind::RouteRulePrecedenceNegative.at("spec/precedence")),
                Some(_) => {}
            }
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}

/// Weight rules over the `spec/route` list.
pub struct RouteChecker<'a> {
    pub route_rule: &'a RouteRule,
}

impl Checker for RouteChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let weights = self.route_rule.spec.route.iter().map(|r| r.weight.as_ref());
        let checks = check_weights(weights, "spec/route");
        let valid = is_valid(&checks);
        (checks, valid)
    }
}

/// `spec/destination` must name a known service.
pub struct DestinationChecker<'a> {
    pub namespace: &'a str,
    pub registry: &'a ServiceRegistry,
    pub route_rule: &'a RouteRule,
}

impl Checker for DestinationChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        let destination = self.route_rule.spec.destination.as_ref();
        if let Some(name) = destination.and_then(|d| d.name.as_deref()) {
            let namespace = destination
                .and_then(|d| d.namespace.as_deref())
                .unwrap_or(self.namespace);
            if !self.registry.resolves(name, namespace) {
                checks.push(CheckKind::RouteRuleDestinationNotFound.at("spec/destination"));
            }
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}
