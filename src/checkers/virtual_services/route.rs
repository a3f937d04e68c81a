//! Weight distribution of every http, tls and tcp route.

use crate::checkers::weights::check_weights;
use crate::checkers::Checker;
use crate::checks::is_valid;
use crate::models::resources::VirtualService;
use crate::models::Check;

pub struct RouteChecker<'a> {
    pub virtual_service: &'a VirtualService,
}

impl Checker for RouteChecker<'_> {
    fn check(&self) -> (Vec<Check>, bool) {
        let mut checks = Vec::new();
        for (protocol, tables) in self.virtual_service.spec.route_tables() {
            for (i, table) in tables.iter().enumerate() {
                let path = format!("spec/{}[{}]/route", protocol, i);
                checks.extend(check_weights(table.route.iter().map(|r| r.weight.as_ref()), &path));
            }
        }
        let valid = is_valid(&checks);
        (checks, valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::fixtures::vs;

    #[test]
    fn test_well_weighted_routes() {
        let v = vs(r#"
metadata: {name: reviews, namespace: bookinfo}
spec:
  http:
    - route:
        - destination: {host: reviews, subset: v1}
          weight: 55
        - destination: {host: reviews, subset: v2}
          weight: 45
    - route:
        - destination: {host: reviews, subset: v3}
"#);
        let (checks, valid) = RouteChecker { virtual_service: &v }.check();
        assert!(checks.is_empty());
        assert!(valid);
    }

    #[test]
    fn test_violations_per_route_table() {
        let v = vs(r#"
metadata: {name: reviews, namespace: bookinfo}
spec:
  http:
    - route:
        - destination: {host: reviews, subset: v1}
          weight: 55
        - destination: {host: reviews, subset: v2}
          weight: 55
  tcp:
    - route:
        - destination: {host: reviews, subset: v1}
          weight: 145
        - destination: {host: reviews, subset: v2}
"#);
        let (checks, valid) = RouteChecker { virtual_service: &v }.check();
        assert!(!valid);
        let found: Vec<(&str, &str)> = checks
            .iter()
            .map(|c| (c.path.as_str(), c.message.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("spec/http[0]/route", "Weight sum should be 100"),
                ("spec/tcp[0]/route[0]/weight", "Weight should be between 0 and 100"),
                ("spec/tcp[0]/route", "All routes should have weight"),
                ("spec/tcp[0]/route", "Weight sum should be 100"),
            ]
        );
    }

    #[test]
    fn test_malformed_routes_have_no_findings() {
        let v = vs(r#"
metadata: {name: reviews, namespace: bookinfo}
spec:
  http: "broken"
  tcp:
    - route: 12
"#);
        let (checks, valid) = RouteChecker { virtual_service: &v }.check();
        assert!(checks.is_empty());
        assert!(valid);
    }
}
