//! Mock VpcClient for unit testing
//!
//! In-memory implementation of `VpcClientTrait` so reconciler tests run
//! without a cloud account. Mutation calls are counted, which lets tests
//! assert that a repeated reconciliation pass issues no provider mutations.

use crate::error::VpcError;
use crate::models::*;
use crate::vpc_trait::VpcClientTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Counters for side-effecting API calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockCalls {
    /// Number of associate_cidr_block calls
    pub associate_cidr: u32,
    /// Number of disassociate_cidr_block calls
    pub disassociate_cidr: u32,
    /// Number of create_subnet calls
    pub create_subnet: u32,
    /// Number of delete_subnet calls
    pub delete_subnet: u32,
}

/// Mock cloud network client for testing
#[derive(Debug, Clone, Default)]
pub struct MockVpcClient {
    vpcs: Arc<Mutex<HashMap<String, Vpc>>>,
    subnets: Arc<Mutex<HashMap<String, Subnet>>>,
    calls: Arc<Mutex<MockCalls>>,
    next_id: Arc<Mutex<u64>>,
}

impl MockVpcClient {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a VPC to the mock store (for test setup)
    pub fn add_vpc(&self, vpc: Vpc) {
        self.vpcs.lock().unwrap().insert(vpc.id.clone(), vpc);
    }

    /// Add a subnet to the mock store (for test setup)
    pub fn add_subnet(&self, subnet: Subnet) {
        self.subnets.lock().unwrap().insert(subnet.id.clone(), subnet);
    }

    /// Force the state of an association (for test setup)
    pub fn set_association_state(&self, vpc_id: &str, cidr: &str, state: CidrAssociationState) {
        let mut vpcs = self.vpcs.lock().unwrap();
        if let Some(vpc) = vpcs.get_mut(vpc_id) {
            if let Some(assoc) = vpc.cidr_associations.iter_mut().find(|a| a.cidr == cidr) {
                assoc.state = state;
            }
        }
    }

    /// Force the state of a subnet (for test setup)
    pub fn set_subnet_state(&self, subnet_id: &str, state: SubnetState) {
        let mut subnets = self.subnets.lock().unwrap();
        if let Some(subnet) = subnets.get_mut(subnet_id) {
            subnet.state = state;
        }
    }

    /// Snapshot of the mutation call counters
    pub fn calls(&self) -> MockCalls {
        self.calls.lock().unwrap().clone()
    }

    /// Identifiers of all subnets currently in the store
    pub fn subnet_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.subnets.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn next_id(&self) -> u64 {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        *id
    }
}

#[async_trait::async_trait]
impl VpcClientTrait for MockVpcClient {
    async fn list_vpcs(&self, name: &str) -> Result<Vec<Vpc>, VpcError> {
        let vpcs = self.vpcs.lock().unwrap();
        let mut found: Vec<Vpc> = vpcs
            .values()
            .filter(|v| v.name.as_deref() == Some(name))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn get_vpc(&self, vpc_id: &str) -> Result<Vpc, VpcError> {
        self.vpcs
            .lock()
            .unwrap()
            .get(vpc_id)
            .cloned()
            .ok_or_else(|| VpcError::NotFound(format!("vpc {vpc_id}")))
    }

    async fn associate_cidr_block(&self, vpc_id: &str, cidr: &str) -> Result<String, VpcError> {
        self.calls.lock().unwrap().associate_cidr += 1;
        let association_id = format!("assoc-{}", self.next_id());
        let mut vpcs = self.vpcs.lock().unwrap();
        let vpc = vpcs
            .get_mut(vpc_id)
            .ok_or_else(|| VpcError::NotFound(format!("vpc {vpc_id}")))?;
        vpc.cidr_associations.push(CidrAssociation {
            association_id: association_id.clone(),
            cidr: cidr.to_string(),
            state: CidrAssociationState::Associating,
        });
        Ok(association_id)
    }

    async fn disassociate_cidr_block(&self, association_id: &str) -> Result<(), VpcError> {
        self.calls.lock().unwrap().disassociate_cidr += 1;
        let mut vpcs = self.vpcs.lock().unwrap();
        for vpc in vpcs.values_mut() {
            if let Some(assoc) = vpc
                .cidr_associations
                .iter_mut()
                .find(|a| a.association_id == association_id)
            {
                if assoc.state == CidrAssociationState::Associating {
                    return Err(VpcError::InvalidRequest(format!(
                        "association {association_id} is still associating"
                    )));
                }
                assoc.state = CidrAssociationState::Disassociating;
                return Ok(());
            }
        }
        Err(VpcError::NotFound(format!("association {association_id}")))
    }

    async fn list_subnets(&self, vpc_id: &str) -> Result<Vec<Subnet>, VpcError> {
        let subnets = self.subnets.lock().unwrap();
        let mut found: Vec<Subnet> = subnets
            .values()
            .filter(|s| s.vpc_id == vpc_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn create_subnet(
        &self,
        vpc_id: &str,
        zone: &str,
        cidr: &str,
        tags: &[Tag],
    ) -> Result<Subnet, VpcError> {
        self.calls.lock().unwrap().create_subnet += 1;
        if !self.vpcs.lock().unwrap().contains_key(vpc_id) {
            return Err(VpcError::NotFound(format!("vpc {vpc_id}")));
        }
        let subnet = Subnet {
            id: format!("subnet-{}", self.next_id()),
            vpc_id: vpc_id.to_string(),
            zone: zone.to_string(),
            cidr: cidr.to_string(),
            state: SubnetState::Pending,
            tags: tags.to_vec(),
        };
        self.subnets
            .lock()
            .unwrap()
            .insert(subnet.id.clone(), subnet.clone());
        Ok(subnet)
    }

    async fn delete_subnet(&self, subnet_id: &str) -> Result<(), VpcError> {
        self.calls.lock().unwrap().delete_subnet += 1;
        self.subnets
            .lock()
            .unwrap()
            .remove(subnet_id)
            .map(|_| ())
            .ok_or_else(|| VpcError::NotFound(format!("subnet {subnet_id}")))
    }
}
