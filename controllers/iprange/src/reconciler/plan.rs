//! CIDR validation and zone range planning.

use super::status::reason;
use super::{StepContext, StepOutcome};
use cidr_math::CidrError;
use crds::IpRangeStatus;
use tracing::info;

/// Validates the requested CIDR and pins it as the effective one.
///
/// The effective CIDR is copied from the spec exactly once; a later spec
/// change is rejected rather than applied, since re-addressing a live range
/// is not supported.
pub(crate) fn ensure_effective_cidr(spec_cidr: &str, status: &mut IpRangeStatus) -> StepOutcome {
    if let Some(effective) = &status.effective_cidr {
        if effective != spec_cidr {
            return StepOutcome::Terminal {
                reason: reason::CIDR_CAN_NOT_CHANGE,
                message: format!("cidr can not change from {effective} to {spec_cidr}"),
            };
        }
        return StepOutcome::Continue;
    }

    match cidr_math::parse(spec_cidr) {
        Ok(net) => {
            status.effective_cidr = Some(net.to_string());
            StepOutcome::Continue
        }
        Err(_) => StepOutcome::Terminal {
            reason: reason::INVALID_CIDR,
            message: format!("invalid cidr {spec_cidr:?}"),
        },
    }
}

/// Splits the effective CIDR into one range per availability zone.
///
/// Skipped unconditionally once `zoneRanges` is populated: recomputing
/// could reshuffle which zone owns which range and silently move existing
/// tenants between subnets.
pub(crate) fn plan_zone_ranges(ctx: &StepContext, status: &mut IpRangeStatus) -> StepOutcome {
    if !status.zone_ranges.is_empty() {
        return StepOutcome::Continue;
    }

    let Some(effective) = status.effective_cidr.clone() else {
        return StepOutcome::Terminal {
            reason: reason::INVALID_CIDR,
            message: "effective cidr is not set".to_string(),
        };
    };
    let block = match cidr_math::parse(&effective) {
        Ok(net) => net,
        Err(_) => {
            return StepOutcome::Terminal {
                reason: reason::INVALID_CIDR,
                message: format!("invalid effective cidr {effective:?}"),
            };
        }
    };

    let ranges = match cidr_math::split_for_zones(block, ctx.zones.len()) {
        Ok(ranges) => ranges,
        Err(CidrError::CannotSplit { zone_count, .. }) => {
            return StepOutcome::Terminal {
                reason: reason::CIDR_CAN_NOT_SPLIT,
                message: format!("cidr {effective} can not be split into {zone_count} zone ranges"),
            };
        }
        Err(CidrError::InvalidCidr(text)) => {
            return StepOutcome::Terminal {
                reason: reason::INVALID_CIDR,
                message: format!("invalid cidr {text:?}"),
            };
        }
    };

    // Can only trip if the zone list changed while ranges were being
    // allocated, which is unsupported.
    if ranges.len() != ctx.zones.len() {
        return StepOutcome::Terminal {
            reason: reason::ZONE_RANGE_MISMATCH,
            message: format!(
                "allocated {} ranges for {} zones",
                ranges.len(),
                ctx.zones.len()
            ),
        };
    }

    status.zone_ranges = ranges.iter().map(ToString::to_string).collect();
    info!(
        "Planned zone ranges for {}: {:?}",
        effective, status.zone_ranges
    );
    StepOutcome::Continue
}
