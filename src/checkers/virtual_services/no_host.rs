//! Every route destination host must name a known service or service entry.

use super::route_destinations;
use crate::checkers::Checker;
use crate::checks::{is_valid, CheckKind};
use crate::models::resources::VirtualService;
use crate::models::Check;
use crate::registry::ServiceRegistry;

pub struct NoHostChecker<'a> {
    pub namespace: &'a str,
    pub registry: &'a ServiceRegistry,
    pub virtual_service: &'a VirtualService,
}

impl Checker for NoHostChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        for (path, dw) in route_destinations(self.virtual_service) {
            let Some(host) = dw.destination.as_ref().and_then(|d| d.host.as_deref()) else {
                continue;
            };
            if !self.registry.resolves(host, self.namespace) {
                checks.push(CheckKind::VirtualServiceHostNotFound.at(format!("{}/destination/host", path)));
            }
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}
