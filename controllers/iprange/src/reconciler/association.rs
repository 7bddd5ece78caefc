//! VPC address-space association management.
//!
//! Drives the provider's CIDR association state machine for the block the
//! range owns: absent -> associating -> associated, and back out again
//! during teardown. The association set is re-listed on every pass; a
//! sibling reconciliation may have changed it in the meantime.

use super::status::reason;
use super::{FAST_REQUEUE, SLOW_REQUEUE, StepContext, StepOutcome};
use crate::error::ControllerError;
use crds::IpRangeStatus;
use tracing::{info, warn};
use vpc_client::{CidrAssociationState, VpcError};

/// Ensures the effective CIDR is associated with the located VPC.
pub(crate) async fn ensure_address_space(
    ctx: &StepContext,
    status: &mut IpRangeStatus,
) -> Result<StepOutcome, ControllerError> {
    let vpc_id = status
        .vpc_id
        .clone()
        .ok_or_else(|| ControllerError::InvalidConfig("vpcId not set".to_string()))?;
    let effective = status
        .effective_cidr
        .clone()
        .ok_or_else(|| ControllerError::InvalidConfig("effectiveCidr not set".to_string()))?;
    let effective_net = match cidr_math::parse(&effective) {
        Ok(net) => net,
        Err(_) => {
            return Ok(StepOutcome::Terminal {
                reason: reason::INVALID_CIDR,
                message: format!("invalid effective cidr {effective:?}"),
            });
        }
    };

    let vpc = match ctx.client.get_vpc(&vpc_id).await {
        Ok(vpc) => vpc,
        Err(VpcError::NotFound(_)) => {
            return Ok(StepOutcome::Terminal {
                reason: reason::VPC_NOT_FOUND,
                message: format!("vpc {vpc_id} no longer exists"),
            });
        }
        Err(e) => return Err(e.into()),
    };

    // Overlap gate runs on every pass: a sibling range may have associated
    // a conflicting block since the last one. Detaching blocks no longer
    // reserve address space and are ignored.
    for assoc in &vpc.cidr_associations {
        if assoc.cidr == effective || assoc.state.is_detaching() {
            continue;
        }
        let other = match cidr_math::parse(&assoc.cidr) {
            Ok(net) => net,
            Err(_) => {
                warn!(
                    "Skipping unparseable association cidr {:?} on vpc {}",
                    assoc.cidr, vpc_id
                );
                continue;
            }
        };
        if cidr_math::overlaps(effective_net, other) {
            return Ok(StepOutcome::Terminal {
                reason: reason::CIDR_OVERLAP,
                message: format!("cidr {effective} overlaps existing block {}", assoc.cidr),
            });
        }
    }

    // Copy the matching element out before acting on it.
    let target = vpc.association_by_cidr(&effective).cloned();
    match target {
        None => {
            // Associate only when the block is confirmed absent from the
            // freshly listed set; the call is not idempotent.
            let association_id = ctx.client.associate_cidr_block(&vpc_id, &effective).await?;
            info!(
                "Associated cidr {} with vpc {} as {}",
                effective, vpc_id, association_id
            );
            status.address_space_association_id = Some(association_id);
            Ok(StepOutcome::RetryAfter(SLOW_REQUEUE))
        }
        Some(assoc) if assoc.state == CidrAssociationState::Disassociated => {
            // The old binding is fully gone; a fresh association of the
            // same block is allowed.
            let association_id = ctx.client.associate_cidr_block(&vpc_id, &effective).await?;
            info!(
                "Re-associated cidr {} with vpc {} as {}",
                effective, vpc_id, association_id
            );
            status.address_space_association_id = Some(association_id);
            Ok(StepOutcome::RetryAfter(SLOW_REQUEUE))
        }
        Some(assoc) => {
            // Adopt the association id, e.g. after a crash between the
            // associate call and the status write.
            if status.address_space_association_id.as_deref() != Some(&assoc.association_id) {
                status.address_space_association_id = Some(assoc.association_id.clone());
            }
            match assoc.state {
                CidrAssociationState::Associated => Ok(StepOutcome::Continue),
                // Waiting states, not errors.
                CidrAssociationState::Associating | CidrAssociationState::Disassociating => {
                    Ok(StepOutcome::RetryAfter(SLOW_REQUEUE))
                }
                CidrAssociationState::Disassociated => unreachable!("handled above"),
            }
        }
    }
}

/// Drives the association to disassociated during teardown.
pub(crate) async fn release_address_space(
    ctx: &StepContext,
    status: &mut IpRangeStatus,
) -> Result<StepOutcome, ControllerError> {
    let Some(vpc_id) = status.vpc_id.clone() else {
        // Never located a VPC: nothing was associated.
        return Ok(StepOutcome::Continue);
    };
    let Some(effective) = status.effective_cidr.clone() else {
        return Ok(StepOutcome::Continue);
    };

    let vpc = match ctx.client.get_vpc(&vpc_id).await {
        Ok(vpc) => vpc,
        Err(VpcError::NotFound(_)) => {
            // VPC is gone, and the association with it.
            status.address_space_association_id = None;
            return Ok(StepOutcome::Continue);
        }
        Err(e) => return Err(e.into()),
    };

    let target = vpc.association_by_cidr(&effective).cloned();
    match target {
        None => {
            status.address_space_association_id = None;
            Ok(StepOutcome::Continue)
        }
        Some(assoc) => match assoc.state {
            CidrAssociationState::Associated => {
                ctx.client
                    .disassociate_cidr_block(&assoc.association_id)
                    .await?;
                info!(
                    "Disassociating cidr {} from vpc {} ({})",
                    effective, vpc_id, assoc.association_id
                );
                Ok(StepOutcome::RetryAfter(FAST_REQUEUE))
            }
            // Disassociating a block that is still associating is invalid;
            // wait for the provider to settle first.
            CidrAssociationState::Associating => Ok(StepOutcome::RetryAfter(FAST_REQUEUE)),
            CidrAssociationState::Disassociating => Ok(StepOutcome::RetryAfter(FAST_REQUEUE)),
            CidrAssociationState::Disassociated => {
                status.address_space_association_id = None;
                Ok(StepOutcome::Continue)
            }
        },
    }
}
