//! Checkers for configuration objects.
//!
//! Two shapes exist:
//! - [`Checker`]: looks at one object plus the minimal context it needs and
//!   returns its findings with a validity flag. These run in parallel.
//! - [`GroupChecker`]: needs the whole collection of one kind to detect
//!   conflicts between objects. These run sequentially after the individual
//!   checks and return a keyed set covering every object they flagged.
//!
//! Checkers never fail. Missing or malformed fields mean "nothing to check".

pub mod authorization;
pub mod destination_rules;
pub mod gateways;
pub mod pods;
mod presence;
pub mod route_rules;
pub mod selector;
pub mod sidecars;
pub mod virtual_services;
pub mod weights;

use crate::models::resources::{Labels, ObjectMeta, Pod};
use crate::models::resources::selector_matches;
use crate::models::Check;
use crate::validations::ValidationSet;

pub trait Checker {
    fn check(&self) -> (Vec<Check>, bool);
}

pub trait GroupChecker {
    fn name(&self) -> &'static str;
    fn check(&self) -> ValidationSet;
}

/// Pods in `namespace` (any namespace for `None`) whose labels match `selector`.
pub(crate) fn matching_pods<'a>(
    pods: &'a [Pod],
    namespace: Option<&'a str>,
    selector: &'a Labels,
) -> impl Iterator<Item = &'a Pod> {
    pods.iter().filter(move |p| {
        namespace.map_or(true, |ns| p.namespace() == ns) && selector_matches(selector, &p.metadata.labels)
    })
}

/// Sort key used by group checkers so the object flagged in a collision does
/// not depend on snapshot order.
pub(crate) fn by_namespace_and_name(a: &ObjectMeta, b: &ObjectMeta) -> std::cmp::Ordering {
    a.namespace.cmp(&b.namespace).then_with(|| a.name.cmp(&b.name))
}
