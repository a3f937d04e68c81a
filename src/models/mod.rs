//! Shared data models: typed input resources and validation output.

pub mod resources;
pub mod validation;

pub use validation::{
    Check, ConfigObjectRef, ObjectType, Severity, ValidationRecord, ValidationSummary,
};
