//! Locating the target VPC.

use super::status::reason;
use super::{StepContext, StepOutcome};
use crate::error::ControllerError;
use crds::IpRangeStatus;
use tracing::info;
use vpc_client::VpcError;

/// Finds the VPC the range belongs to and caches its identifier.
///
/// The first pass searches by the Name tag, because the identifier is not
/// known a priori; once `vpcId` is persisted, later passes load directly by
/// identifier. A cached identifier that no longer resolves is a terminal
/// error, not something to ignore: the address space would otherwise leak.
pub(crate) async fn locate_vpc(
    ctx: &StepContext,
    status: &mut IpRangeStatus,
) -> Result<StepOutcome, ControllerError> {
    if let Some(vpc_id) = status.vpc_id.clone() {
        return match ctx.client.get_vpc(&vpc_id).await {
            Ok(_) => Ok(StepOutcome::Continue),
            Err(VpcError::NotFound(_)) => Ok(StepOutcome::Terminal {
                reason: reason::VPC_NOT_FOUND,
                message: format!("vpc {vpc_id} no longer exists"),
            }),
            Err(e) => Err(e.into()),
        };
    }

    let vpcs = ctx.client.list_vpcs(&ctx.vpc_name).await?;
    match vpcs.as_slice() {
        [] => Ok(StepOutcome::Terminal {
            reason: reason::VPC_NOT_FOUND,
            message: format!("no vpc found with name {:?}", ctx.vpc_name),
        }),
        [vpc] => {
            info!("Located vpc {} for name {:?}", vpc.id, ctx.vpc_name);
            status.vpc_id = Some(vpc.id.clone());
            Ok(StepOutcome::Continue)
        }
        // Ambiguity is treated like a missing VPC: picking one of several
        // same-named networks could allocate into the wrong tenant.
        many => Ok(StepOutcome::Terminal {
            reason: reason::VPC_NOT_FOUND,
            message: format!(
                "multiple vpcs ({}) found with name {:?}",
                many.len(),
                ctx.vpc_name
            ),
        }),
    }
}
