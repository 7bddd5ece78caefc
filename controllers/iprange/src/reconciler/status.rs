//! Status projection and persistence for IpRange resources.

use super::StatusSink;
use crate::error::ControllerError;
use crds::{
    CONDITION_TYPE_ERROR, CONDITION_TYPE_READY, Condition, IpRange, IpRangeStatus, RangeState,
    remove_condition, set_condition,
};
use kube::Api;
use kube::api::{Patch, PatchParams};
use serde_json::json;
use std::sync::Mutex;
use tracing::debug;

/// Machine-readable reasons recorded on Error conditions
pub(crate) mod reason {
    pub(crate) const INVALID_CIDR: &str = "InvalidCidr";
    pub(crate) const CIDR_CAN_NOT_CHANGE: &str = "CidrCanNotChange";
    pub(crate) const CIDR_CAN_NOT_SPLIT: &str = "CidrCanNotSplit";
    pub(crate) const CIDR_OVERLAP: &str = "CidrOverlap";
    pub(crate) const VPC_NOT_FOUND: &str = "VpcNotFound";
    pub(crate) const ZONE_RANGE_MISMATCH: &str = "ZoneRangeMismatch";
}

/// Marks the range Ready and clears any previous error.
pub(crate) fn project_ready(status: &mut IpRangeStatus) {
    status.state = Some(RangeState::Ready);
    set_condition(
        &mut status.conditions,
        Condition::new_true(
            CONDITION_TYPE_READY,
            "Ready",
            "address space and subnets are provisioned",
        ),
    );
    remove_condition(&mut status.conditions, CONDITION_TYPE_ERROR);
}

/// Marks the range failed with a terminal error.
pub(crate) fn project_error(status: &mut IpRangeStatus, reason: &str, message: &str) {
    status.state = Some(RangeState::Error);
    set_condition(
        &mut status.conditions,
        Condition::new_true(CONDITION_TYPE_ERROR, reason, message),
    );
    remove_condition(&mut status.conditions, CONDITION_TYPE_READY);
}

/// Writes status through the status subresource, skipping no-op patches.
pub(crate) struct KubeStatusSink {
    api: Api<IpRange>,
    name: String,
    last: Mutex<Option<IpRangeStatus>>,
}

impl KubeStatusSink {
    pub(crate) fn new(api: Api<IpRange>, name: String, current: Option<IpRangeStatus>) -> Self {
        Self {
            api,
            name,
            last: Mutex::new(current),
        }
    }
}

#[async_trait::async_trait]
impl StatusSink for KubeStatusSink {
    async fn persist(&self, status: &IpRangeStatus) -> Result<(), ControllerError> {
        {
            let last = self.last.lock().map_err(|_| {
                ControllerError::InvalidConfig("status sink mutex poisoned".to_string())
            })?;
            if last.as_ref() == Some(status) {
                debug!("IpRange {} status unchanged, skipping patch", self.name);
                return Ok(());
            }
        }

        let patch = json!({"status": status});
        self.api
            .patch_status(&self.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        debug!("IpRange {} status persisted", self.name);

        if let Ok(mut last) = self.last.lock() {
            *last = Some(status.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::find_condition;

    #[test]
    fn ready_clears_error() {
        let mut status = IpRangeStatus::default();
        project_error(&mut status, reason::CIDR_OVERLAP, "overlaps 10.0.1.0/24");
        assert_eq!(status.state, Some(RangeState::Error));
        assert!(find_condition(&status.conditions, CONDITION_TYPE_ERROR).is_some());

        project_ready(&mut status);
        assert_eq!(status.state, Some(RangeState::Ready));
        assert!(find_condition(&status.conditions, CONDITION_TYPE_ERROR).is_none());
        let ready = find_condition(&status.conditions, CONDITION_TYPE_READY).unwrap();
        assert_eq!(ready.status, "True");
    }

    #[test]
    fn error_records_reason_and_message() {
        let mut status = IpRangeStatus::default();
        project_error(&mut status, reason::VPC_NOT_FOUND, "no vpc named wl-1");
        let error = find_condition(&status.conditions, CONDITION_TYPE_ERROR).unwrap();
        assert_eq!(error.reason, "VpcNotFound");
        assert_eq!(error.message, "no vpc named wl-1");
        assert!(find_condition(&status.conditions, CONDITION_TYPE_READY).is_none());
    }
}
