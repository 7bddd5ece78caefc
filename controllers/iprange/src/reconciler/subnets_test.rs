use super::subnets::{MANAGED_BY_VALUE, TAG_MANAGED_BY, TAG_OWNER, delete_subnets, reconcile_subnets};
use super::{FAST_REQUEUE, SLOW_REQUEUE, StatusSink, StepContext, StepOutcome};
use crate::error::ControllerError;
use crds::IpRangeStatus;
use std::sync::{Arc, Mutex};
use vpc_client::{MockVpcClient, Subnet, SubnetState, Tag, Vpc};

const OWNER: &str = "default/range-1";

/// Captures every persisted status snapshot in order.
struct RecordingSink {
    persisted: Mutex<Vec<IpRangeStatus>>,
}

impl RecordingSink {
    fn new() -> Self {
        Self {
            persisted: Mutex::new(Vec::new()),
        }
    }

    fn snapshots(&self) -> Vec<IpRangeStatus> {
        self.persisted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl StatusSink for RecordingSink {
    async fn persist(&self, status: &IpRangeStatus) -> Result<(), ControllerError> {
        self.persisted.lock().unwrap().push(status.clone());
        Ok(())
    }
}

fn managed_subnet(id: &str, zone: &str, cidr: &str, state: SubnetState) -> Subnet {
    Subnet {
        id: id.to_string(),
        vpc_id: "vpc-1".to_string(),
        zone: zone.to_string(),
        cidr: cidr.to_string(),
        state,
        tags: vec![
            Tag::new(TAG_MANAGED_BY, MANAGED_BY_VALUE),
            Tag::new(TAG_OWNER, OWNER),
        ],
    }
}

fn mock_with_vpc() -> MockVpcClient {
    let mock = MockVpcClient::new();
    mock.add_vpc(Vpc {
        id: "vpc-1".to_string(),
        name: Some("wl-1".to_string()),
        cidr_block: "10.0.0.0/16".to_string(),
        cidr_associations: vec![],
    });
    mock
}

fn ctx(mock: &MockVpcClient, zones: &[&str]) -> StepContext {
    StepContext {
        client: Arc::new(mock.clone()),
        zones: zones.iter().map(ToString::to_string).collect(),
        vpc_name: "wl-1".to_string(),
        owner: OWNER.to_string(),
    }
}

fn status_with_ranges(ranges: &[&str]) -> IpRangeStatus {
    IpRangeStatus {
        vpc_id: Some("vpc-1".to_string()),
        effective_cidr: Some("10.0.0.0/24".to_string()),
        zone_ranges: ranges.iter().map(ToString::to_string).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn complete_set_is_a_noop() {
    let mock = mock_with_vpc();
    mock.add_subnet(managed_subnet("subnet-b", "zone-b", "10.0.0.64/26", SubnetState::Available));
    mock.add_subnet(managed_subnet("subnet-a", "zone-a", "10.0.0.0/26", SubnetState::Available));
    let mut status = status_with_ranges(&["10.0.0.0/26", "10.0.0.64/26"]);
    let sink = RecordingSink::new();

    let outcome = reconcile_subnets(&ctx(&mock, &["zone-a", "zone-b"]), &mut status, &sink)
        .await
        .unwrap();
    assert_eq!(outcome, StepOutcome::Continue);
    assert_eq!(mock.calls(), Default::default());

    // observed list follows zone order regardless of listing order
    let ids: Vec<&str> = status.subnets.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["subnet-a", "subnet-b"]);
}

#[tokio::test]
async fn missing_subnets_are_created_with_persist_after_each() {
    let mock = mock_with_vpc();
    mock.add_subnet(managed_subnet("subnet-a", "zone-a", "10.0.0.0/26", SubnetState::Available));
    let mut status = status_with_ranges(&["10.0.0.0/26", "10.0.0.64/26", "10.0.0.128/26"]);
    let sink = RecordingSink::new();

    let outcome = reconcile_subnets(
        &ctx(&mock, &["zone-a", "zone-b", "zone-c"]),
        &mut status,
        &sink,
    )
    .await
    .unwrap();
    assert_eq!(outcome, StepOutcome::RetryAfter(SLOW_REQUEUE));
    assert_eq!(mock.calls().create_subnet, 2);
    assert_eq!(mock.calls().delete_subnet, 0);
    assert_eq!(status.subnets.len(), 3);

    // one snapshot per created subnet, each one subnet longer
    let snapshots = sink.snapshots();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].subnets.len(), 2);
    assert_eq!(snapshots[1].subnets.len(), 3);
}

#[tokio::test]
async fn stale_managed_subnet_is_deleted_before_creating() {
    let mock = mock_with_vpc();
    mock.add_subnet(managed_subnet("subnet-x", "zone-a", "10.9.9.0/26", SubnetState::Available));
    let mut status = status_with_ranges(&["10.0.0.0/26"]);
    let sink = RecordingSink::new();

    let outcome = reconcile_subnets(&ctx(&mock, &["zone-a"]), &mut status, &sink)
        .await
        .unwrap();
    assert_eq!(outcome, StepOutcome::RetryAfter(FAST_REQUEUE));
    assert_eq!(mock.calls().delete_subnet, 1);
    assert_eq!(mock.calls().create_subnet, 0);
    assert!(mock.subnet_ids().is_empty());
}

#[tokio::test]
async fn unmanaged_subnets_are_never_touched() {
    let mock = mock_with_vpc();
    mock.add_subnet(Subnet {
        id: "subnet-foreign".to_string(),
        vpc_id: "vpc-1".to_string(),
        zone: "zone-a".to_string(),
        cidr: "10.9.9.0/26".to_string(),
        state: SubnetState::Available,
        tags: vec![Tag::new("team", "platform")],
    });
    let mut status = status_with_ranges(&["10.0.0.0/26"]);
    let sink = RecordingSink::new();

    let outcome = reconcile_subnets(&ctx(&mock, &["zone-a"]), &mut status, &sink)
        .await
        .unwrap();
    assert_eq!(outcome, StepOutcome::RetryAfter(SLOW_REQUEUE));
    assert_eq!(mock.calls().delete_subnet, 0);
    assert_eq!(mock.calls().create_subnet, 1);
    assert!(mock.subnet_ids().contains(&"subnet-foreign".to_string()));
}

#[tokio::test]
async fn pending_subnet_keeps_the_range_settling() {
    let mock = mock_with_vpc();
    mock.add_subnet(managed_subnet("subnet-a", "zone-a", "10.0.0.0/26", SubnetState::Pending));
    let mut status = status_with_ranges(&["10.0.0.0/26"]);
    let sink = RecordingSink::new();

    let outcome = reconcile_subnets(&ctx(&mock, &["zone-a"]), &mut status, &sink)
        .await
        .unwrap();
    assert_eq!(outcome, StepOutcome::RetryAfter(SLOW_REQUEUE));
    assert_eq!(mock.calls(), Default::default());
}

#[tokio::test]
async fn teardown_deletes_all_available_subnets_in_one_pass() {
    let mock = mock_with_vpc();
    mock.add_subnet(managed_subnet("subnet-a", "zone-a", "10.0.0.0/26", SubnetState::Available));
    mock.add_subnet(managed_subnet("subnet-b", "zone-b", "10.0.0.64/26", SubnetState::Available));
    let mut status = status_with_ranges(&["10.0.0.0/26", "10.0.0.64/26"]);

    let outcome = delete_subnets(&ctx(&mock, &[]), &mut status).await.unwrap();
    assert_eq!(outcome, StepOutcome::RetryAfter(FAST_REQUEUE));
    assert_eq!(mock.calls().delete_subnet, 2);

    // next pass finds nothing managed and finishes
    let outcome = delete_subnets(&ctx(&mock, &[]), &mut status).await.unwrap();
    assert_eq!(outcome, StepOutcome::Continue);
    assert!(status.subnets.is_empty());
}

#[tokio::test]
async fn teardown_without_located_vpc_is_a_noop() {
    let mock = MockVpcClient::new();
    let mut status = IpRangeStatus::default();

    let outcome = delete_subnets(&ctx(&mock, &[]), &mut status).await.unwrap();
    assert_eq!(outcome, StepOutcome::Continue);
    assert_eq!(mock.calls(), Default::default());
}
