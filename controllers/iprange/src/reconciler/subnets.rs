//! Per-zone subnet reconciliation.
//!
//! Desired state is the positional pairing of the scope's zone list with
//! the planned zone ranges. Actual state is whatever subnets the provider
//! lists for the VPC, narrowed to the ones this range owns via tags.

use super::{FAST_REQUEUE, SLOW_REQUEUE, StatusSink, StepContext, StepOutcome};
use crate::error::ControllerError;
use crds::{IpRangeStatus, IpRangeSubnet};
use tracing::{info, warn};
use vpc_client::{Subnet, SubnetState, Tag};

/// Tag marking a subnet as controller-managed
pub(crate) const TAG_MANAGED_BY: &str = "managed-by";
/// Value of the managed-by tag
pub(crate) const MANAGED_BY_VALUE: &str = "iprange-controller";
/// Tag carrying the owning range's `namespace/name` key
pub(crate) const TAG_OWNER: &str = "iprange-owner";

fn is_managed(subnet: &Subnet, owner: &str) -> bool {
    subnet.tag(TAG_MANAGED_BY) == Some(MANAGED_BY_VALUE) && subnet.tag(TAG_OWNER) == Some(owner)
}

/// Zone/range pairs the range should end up with, in zone order.
fn desired_pairs<'a>(zones: &'a [String], zone_ranges: &'a [String]) -> Vec<(&'a str, &'a str)> {
    zones
        .iter()
        .map(String::as_str)
        .zip(zone_ranges.iter().map(String::as_str))
        .collect()
}

/// Converges the VPC's subnets towards one per zone range.
///
/// Unmanaged subnets in the VPC are never touched. Managed subnets that no
/// longer match any desired pair are deleted before anything new is created,
/// so a half-applied earlier plan cannot leave orphans behind.
pub(crate) async fn reconcile_subnets(
    ctx: &StepContext,
    status: &mut IpRangeStatus,
    sink: &dyn StatusSink,
) -> Result<StepOutcome, ControllerError> {
    let vpc_id = status
        .vpc_id
        .clone()
        .ok_or_else(|| ControllerError::InvalidConfig("vpcId not set".to_string()))?;
    let desired = desired_pairs(&ctx.zones, &status.zone_ranges);

    let all = ctx.client.list_subnets(&vpc_id).await?;
    let managed: Vec<Subnet> = all
        .into_iter()
        .filter(|s| is_managed(s, &ctx.owner))
        .collect();

    // Delete stale managed subnets first; their address space may be
    // exactly what a desired subnet needs.
    let mut deleted = false;
    for subnet in &managed {
        let wanted = desired
            .iter()
            .any(|(zone, range)| subnet.zone == *zone && subnet.cidr == *range);
        if wanted {
            continue;
        }
        match subnet.state {
            SubnetState::Available => {
                warn!(
                    "Deleting stale subnet {} ({} in {})",
                    subnet.id, subnet.cidr, subnet.zone
                );
                ctx.client.delete_subnet(&subnet.id).await?;
                deleted = true;
            }
            // Pending subnets cannot be deleted yet; Deleting ones are
            // already on their way out.
            SubnetState::Pending | SubnetState::Deleting => {}
        }
    }
    if deleted {
        return Ok(StepOutcome::RetryAfter(FAST_REQUEUE));
    }

    // Rebuild the observed subnet list in zone order from live state.
    status.subnets = desired
        .iter()
        .filter_map(|(zone, range)| {
            managed
                .iter()
                .find(|s| s.zone == *zone && s.cidr == *range)
                .map(|s| IpRangeSubnet {
                    id: s.id.clone(),
                    zone: s.zone.clone(),
                    range: s.cidr.clone(),
                })
        })
        .collect();

    let mut created = false;
    for (zone, range) in &desired {
        let exists = managed
            .iter()
            .any(|s| s.zone == *zone && s.cidr == *range);
        if exists {
            continue;
        }
        let tags = [
            Tag::new(TAG_MANAGED_BY, MANAGED_BY_VALUE),
            Tag::new(TAG_OWNER, &ctx.owner),
        ];
        let subnet = ctx.client.create_subnet(&vpc_id, zone, range, &tags).await?;
        info!("Created subnet {} ({} in {})", subnet.id, range, zone);
        status.subnets.push(IpRangeSubnet {
            id: subnet.id,
            zone: subnet.zone,
            range: subnet.cidr,
        });
        // Persist after every creation, so a crash mid-loop does not lose
        // track of subnets that already exist.
        sink.persist(status).await?;
        created = true;
    }
    if created {
        return Ok(StepOutcome::RetryAfter(SLOW_REQUEUE));
    }

    // All pairs exist; wait for any that are still materializing.
    let settling = managed.iter().any(|s| s.state != SubnetState::Available);
    if settling {
        return Ok(StepOutcome::RetryAfter(SLOW_REQUEUE));
    }
    Ok(StepOutcome::Continue)
}

/// Deletes all managed subnets during teardown.
pub(crate) async fn delete_subnets(
    ctx: &StepContext,
    status: &mut IpRangeStatus,
) -> Result<StepOutcome, ControllerError> {
    let Some(vpc_id) = status.vpc_id.clone() else {
        // Without a located VPC no subnets were ever created.
        status.subnets.clear();
        return Ok(StepOutcome::Continue);
    };

    let all = match ctx.client.list_subnets(&vpc_id).await {
        Ok(all) => all,
        Err(vpc_client::VpcError::NotFound(_)) => {
            status.subnets.clear();
            return Ok(StepOutcome::Continue);
        }
        Err(e) => return Err(e.into()),
    };
    let managed: Vec<Subnet> = all
        .into_iter()
        .filter(|s| is_managed(s, &ctx.owner))
        .collect();

    if managed.is_empty() {
        status.subnets.clear();
        return Ok(StepOutcome::Continue);
    }

    for subnet in &managed {
        match subnet.state {
            SubnetState::Available => {
                info!("Deleting subnet {} ({})", subnet.id, subnet.cidr);
                ctx.client.delete_subnet(&subnet.id).await?;
            }
            SubnetState::Pending | SubnetState::Deleting => {}
        }
    }
    Ok(StepOutcome::RetryAfter(FAST_REQUEUE))
}
