//! IpRange CRD
//!
//! Requests an isolated IPv4 address block inside a cloud VPC, subdivided
//! into one subnet per availability zone of the referenced scope.

use crate::condition::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Finalizer guarding VPC-side teardown of an IpRange
pub const IPRANGE_FINALIZER: &str = "iprange.cloudops.microscaler.io/finalizer";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "cloudops.microscaler.io",
    version = "v1alpha1",
    kind = "IpRange",
    namespaced,
    status = "IpRangeStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct IpRangeSpec {
    /// Desired CIDR block, immutable once provisioning has started
    pub cidr: String,

    /// Reference to the CloudScope supplying zones and the VPC name
    pub scope_ref: ScopeRef,
}

/// Reference to a CloudScope resource
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScopeRef {
    /// Name of the CloudScope
    pub name: String,

    /// Namespace (defaults to the IpRange's namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IpRangeStatus {
    /// Provisioning state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RangeState>,

    /// CIDR the controller is provisioning (copied from spec on first pass)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_cidr: Option<String>,

    /// Identifier of the located VPC, cached after the first lookup by name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,

    /// Identifier of the VPC CIDR block association
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_space_association_id: Option<String>,

    /// One sub-CIDR per availability zone, in zone order.
    ///
    /// Never recomputed once populated: reshuffling would silently move
    /// existing tenants between subnets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zone_ranges: Vec<String>,

    /// Subnets provisioned for this range
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<IpRangeSubnet>,

    /// Observed conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Provisioning state of an IpRange
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum RangeState {
    /// Provisioning in progress
    Processing,
    /// All subnets provisioned and available
    Ready,
    /// Terminal error, waiting for a spec change
    Error,
}

/// A provisioned subnet recorded on the IpRange status
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IpRangeSubnet {
    /// Provider subnet identifier
    pub id: String,
    /// Availability zone
    pub zone: String,
    /// Subnet CIDR
    pub range: String,
}

impl IpRangeStatus {
    /// Looks up a recorded subnet by provider identifier.
    pub fn subnet_by_id(&self, id: &str) -> Option<&IpRangeSubnet> {
        self.subnets.iter().find(|s| s.id == id)
    }

    /// Looks up a recorded subnet by zone.
    pub fn subnet_by_zone(&self, zone: &str) -> Option<&IpRangeSubnet> {
        self.subnets.iter().find(|s| s.zone == zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_subnet_lookups() {
        let status = IpRangeStatus {
            subnets: vec![
                IpRangeSubnet {
                    id: "subnet-1".to_string(),
                    zone: "eu-west-1a".to_string(),
                    range: "10.0.0.0/26".to_string(),
                },
                IpRangeSubnet {
                    id: "subnet-2".to_string(),
                    zone: "eu-west-1b".to_string(),
                    range: "10.0.0.64/26".to_string(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(status.subnet_by_id("subnet-2").map(|s| s.zone.as_str()), Some("eu-west-1b"));
        assert_eq!(
            status.subnet_by_zone("eu-west-1a").map(|s| s.id.as_str()),
            Some("subnet-1")
        );
        assert!(status.subnet_by_id("subnet-9").is_none());
    }

    #[test]
    fn state_serializes_as_pascal_case() {
        assert_eq!(serde_json::to_string(&RangeState::Ready).unwrap(), "\"Ready\"");
        assert_eq!(
            serde_json::to_string(&RangeState::Processing).unwrap(),
            "\"Processing\""
        );
    }
}
