//! Cloud network API models

use serde::{Deserialize, Serialize};

/// A virtual private network container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vpc {
    /// Provider-assigned identifier
    pub id: String,

    /// Name tag, if set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Primary CIDR block
    pub cidr_block: String,

    /// Address blocks associated with this VPC, including the primary
    #[serde(default)]
    pub cidr_associations: Vec<CidrAssociation>,
}

impl Vpc {
    /// Finds the association carrying exactly the given CIDR.
    pub fn association_by_cidr(&self, cidr: &str) -> Option<&CidrAssociation> {
        self.cidr_associations.iter().find(|a| a.cidr == cidr)
    }
}

/// A provider-tracked binding of one CIDR block to a VPC
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CidrAssociation {
    /// Association identifier, used for disassociation
    pub association_id: String,

    /// The associated CIDR block
    pub cidr: String,

    /// Association lifecycle state
    pub state: CidrAssociationState,
}

/// Lifecycle state of a CIDR block association
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CidrAssociationState {
    /// Association requested, not yet effective
    Associating,
    /// Block is attached and usable
    Associated,
    /// Detach in progress
    Disassociating,
    /// Block is detached
    Disassociated,
}

impl CidrAssociationState {
    /// Whether the block is on its way out (or already gone).
    ///
    /// Blocks in these states do not reserve address space, so they are
    /// ignored by overlap detection.
    pub fn is_detaching(self) -> bool {
        matches!(
            self,
            CidrAssociationState::Disassociating | CidrAssociationState::Disassociated
        )
    }
}

/// A subnet inside a VPC
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subnet {
    /// Provider-assigned identifier
    pub id: String,

    /// VPC this subnet belongs to
    pub vpc_id: String,

    /// Availability zone
    pub zone: String,

    /// Subnet CIDR block
    pub cidr: String,

    /// Provisioning state
    pub state: SubnetState,

    /// Tag set
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Subnet {
    /// Returns the value of the tag with the given key, if present.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}

/// Provisioning state of a subnet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SubnetState {
    /// Creation in progress
    Pending,
    /// Ready for use
    Available,
    /// Deletion in progress
    Deleting,
}

/// A key/value resource tag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    /// Tag key
    pub key: String,
    /// Tag value
    pub value: String,
}

impl Tag {
    /// Convenience constructor.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Request body for associating a CIDR block
#[derive(Debug, Serialize)]
pub struct AssociateCidrRequest<'a> {
    /// Block to associate
    pub cidr: &'a str,
}

/// Request body for creating a subnet
#[derive(Debug, Serialize)]
pub struct CreateSubnetRequest<'a> {
    /// Availability zone for the subnet
    pub zone: &'a str,
    /// Subnet CIDR
    pub cidr: &'a str,
    /// Tags applied at creation
    pub tags: &'a [Tag],
}

/// Envelope for list endpoints
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    /// Result page
    pub results: Vec<T>,
}
