//! Checkers for DestinationRules.

mod mtls;
mod multi_match;
mod no_dest;

pub use mtls::{DisabledNamespaceWideMtlsChecker, TrafficPolicyChecker};
pub use multi_match::MultiMatchChecker;
pub use no_dest::NoDestinationChecker;
