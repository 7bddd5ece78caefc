//! CloudScope CRD
//!
//! Describes the cloud landscape an IpRange is provisioned into: the region,
//! the name of the target VPC and the ordered availability zone list. Owned
//! by the platform; read-only to the IpRange controller.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "cloudops.microscaler.io",
    version = "v1alpha1",
    kind = "CloudScope",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct CloudScopeSpec {
    /// Cloud region
    pub region: String,

    /// Name tag of the target VPC
    pub vpc_name: String,

    /// Availability zones, in the order zone ranges are assigned.
    ///
    /// The order is load-bearing: zoneRanges on IpRange statuses pair with
    /// this list positionally.
    pub zones: Vec<String>,
}
