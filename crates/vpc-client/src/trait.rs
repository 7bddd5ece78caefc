//! VpcClient trait for mocking
//!
//! Abstracts the cloud network API so reconciler tests can substitute an
//! in-memory implementation. The concrete `VpcClient` implements this trait.

use crate::error::VpcError;
use crate::models::*;

/// Cloud network API operations used by the IpRange controller
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait VpcClientTrait: Send + Sync {
    /// Lists VPCs whose Name tag equals `name`.
    async fn list_vpcs(&self, name: &str) -> Result<Vec<Vpc>, VpcError>;

    /// Loads a VPC by identifier, including its CIDR association set.
    async fn get_vpc(&self, vpc_id: &str) -> Result<Vpc, VpcError>;

    /// Associates `cidr` with the VPC, returning the association identifier.
    ///
    /// Not idempotent: callers must confirm the block is absent first.
    async fn associate_cidr_block(&self, vpc_id: &str, cidr: &str) -> Result<String, VpcError>;

    /// Starts disassociating a CIDR block.
    ///
    /// Invalid while the association is still in the associating state.
    async fn disassociate_cidr_block(&self, association_id: &str) -> Result<(), VpcError>;

    /// Lists all subnets in the VPC, managed or not.
    async fn list_subnets(&self, vpc_id: &str) -> Result<Vec<Subnet>, VpcError>;

    /// Creates a subnet in the given zone with the given tags.
    async fn create_subnet(
        &self,
        vpc_id: &str,
        zone: &str,
        cidr: &str,
        tags: &[Tag],
    ) -> Result<Subnet, VpcError>;

    /// Deletes a subnet by identifier.
    async fn delete_subnet(&self, subnet_id: &str) -> Result<(), VpcError>;
}
