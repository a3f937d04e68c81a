//! Weight rules shared by virtual service routes and legacy route rules.
//!
//! For one route (a list of weighted destinations):
//! - a declared weight must be an integer, else "must be a number";
//! - it must be within 0..=100;
//! - once one entry declares a weight, every entry must;
//! - declared weights must add up to 100.
//!
//! A route with no weights at all is fine. Each rule reports independently.

use crate::checks::CheckKind;
use crate::models::Check;
use serde_json::Value as Json;

/// Integer value of a raw scalar, accepting numeric strings.
pub(crate) fn parse_integer(value: &Json) -> Option<i64> {
    match value {
        Json::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Check the weights of one route located at `route_path`
/// (e.g. `spec/http[0]/route`).
pub fn check_weights<'a, I>(weights: I, route_path: &str) -> Vec<Check>
where
    I: IntoIterator<Item = Option<&'a Json>>,
{
    let mut checks = Vec::new();
    let mut entries = 0usize;
    let mut declared = 0usize;
    let mut sum = 0i64;

    for (i, weight) in weights.into_iter().enumerate() {
        entries += 1;
        let Some(raw) = weight else { continue };
        declared += 1;
        match parse_integer(raw) {
            None => checks.push(CheckKind::WeightNotNumber.at(format!("{}[{}]/weight", route_path, i))),
            Some(w) => {
                if !(0..=100).contains(&w) {
                    checks.push(CheckKind::WeightOutOfRange.at(format!("{}[{}]/weight", route_path, i)));
                }
                sum = sum.saturating_add(w);
            }
        }
    }

    if declared > 0 && declared < entries {
        checks.push(CheckKind::WeightMissing.at(route_path));
    }
    if declared > 0 && sum != 100 {
        checks.push(CheckKind::WeightSumNot100.at(route_path));
    }
    checks
}
