//! CloudRange CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the CloudRange controllers.

pub mod cloud_scope;
pub mod condition;
pub mod ip_range;

pub use cloud_scope::*;
pub use condition::*;
pub use ip_range::*;
