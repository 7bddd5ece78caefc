//! Reconciliation engine for IpRange resources.
//!
//! A reconciliation pass runs an ordered step sequence against freshly
//! listed provider state. Every step mutates an in-memory copy of the
//! resource status and reports a [`StepOutcome`]; the driver persists the
//! status between steps and maps the first non-continue outcome onto a
//! controller [`Action`]. Steps never block on provider transitions - they
//! hand back a retry delay and the whole sequence re-runs from scratch.

pub(crate) mod association;
pub(crate) mod locate_vpc;
pub(crate) mod plan;
pub(crate) mod status;
pub(crate) mod subnets;

#[cfg(test)]
mod subnets_test;

use crate::error::ControllerError;
use crds::{CloudScope, IPRANGE_FINALIZER, IpRange, IpRangeStatus, RangeState};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use kube_runtime::controller::Action;
use serde_json::json;
use status::KubeStatusSink;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use vpc_client::VpcClientTrait;

/// Delay for fast-moving provider states (subnet deletion, disassociation)
pub(crate) const FAST_REQUEUE: Duration = Duration::from_secs(1);
/// Delay for slow-moving provider states (CIDR association, subnet creation)
pub(crate) const SLOW_REQUEUE: Duration = Duration::from_secs(10);
/// Re-check interval for a Ready range, to catch out-of-band drift
const DRIFT_REQUEUE: Duration = Duration::from_secs(600);

/// Result of one reconciliation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// Step is satisfied, proceed to the next one
    Continue,
    /// Waiting on a provider transition, re-run the sequence after the delay
    RetryAfter(Duration),
    /// Configuration error: stop requeuing until the spec changes
    Terminal {
        /// Machine-readable reason for the Error condition
        reason: &'static str,
        /// Human-readable message
        message: String,
    },
}

/// Immutable inputs shared by all steps of one pass
pub(crate) struct StepContext {
    /// Cloud network API client
    pub client: Arc<dyn VpcClientTrait>,
    /// Availability zones, in scope order
    pub zones: Vec<String>,
    /// Name tag of the target VPC
    pub vpc_name: String,
    /// Owner key (`namespace/name`) recorded on managed subnets
    pub owner: String,
}

/// Persists status mid-pass, so state survives a crash between side effects.
#[async_trait::async_trait]
pub(crate) trait StatusSink: Send + Sync {
    /// Writes the status if it differs from the last persisted version.
    async fn persist(&self, status: &IpRangeStatus) -> Result<(), ControllerError>;
}

/// Runs the provisioning step sequence until done or suspended.
pub(crate) async fn run_provisioning(
    ctx: &StepContext,
    spec_cidr: &str,
    status: &mut IpRangeStatus,
    sink: &dyn StatusSink,
) -> Result<StepOutcome, ControllerError> {
    let outcome = plan::ensure_effective_cidr(spec_cidr, status);
    sink.persist(status).await?;
    match outcome {
        StepOutcome::Continue => {}
        other => return Ok(other),
    }

    let outcome = locate_vpc::locate_vpc(ctx, status).await?;
    sink.persist(status).await?;
    match outcome {
        StepOutcome::Continue => {}
        other => return Ok(other),
    }

    let outcome = association::ensure_address_space(ctx, status).await?;
    sink.persist(status).await?;
    match outcome {
        StepOutcome::Continue => {}
        other => return Ok(other),
    }

    let outcome = plan::plan_zone_ranges(ctx, status);
    sink.persist(status).await?;
    match outcome {
        StepOutcome::Continue => {}
        other => return Ok(other),
    }

    let outcome = subnets::reconcile_subnets(ctx, status, sink).await?;
    sink.persist(status).await?;
    Ok(outcome)
}

/// Runs the teardown step sequence: subnets first, then the association.
pub(crate) async fn run_teardown(
    ctx: &StepContext,
    status: &mut IpRangeStatus,
    sink: &dyn StatusSink,
) -> Result<StepOutcome, ControllerError> {
    let outcome = subnets::delete_subnets(ctx, status).await?;
    sink.persist(status).await?;
    match outcome {
        StepOutcome::Continue => {}
        other => return Ok(other),
    }

    let outcome = association::release_address_space(ctx, status).await?;
    sink.persist(status).await?;
    Ok(outcome)
}

/// Reconciles IpRange resources against the cloud network API.
pub struct Reconciler {
    kube_client: Client,
    vpc_client: Arc<dyn VpcClientTrait>,
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(kube_client: Client, vpc_client: Arc<dyn VpcClientTrait>) -> Self {
        Self {
            kube_client,
            vpc_client,
        }
    }

    /// Reconciles one IpRange: provisioning, or teardown when it is marked
    /// for deletion.
    pub async fn reconcile(&self, range: &IpRange) -> Result<Action, ControllerError> {
        let name = range
            .metadata
            .name
            .clone()
            .ok_or_else(|| ControllerError::InvalidConfig("IpRange missing name".to_string()))?;
        let namespace = range.metadata.namespace.as_deref().unwrap_or("default");

        info!("Reconciling IpRange {}/{}", namespace, name);

        let ip_range_api: Api<IpRange> = Api::namespaced(self.kube_client.clone(), namespace);
        let owner = format!("{namespace}/{name}");
        let mut status = range.status.clone().unwrap_or_default();
        let sink = KubeStatusSink::new(ip_range_api.clone(), name.clone(), range.status.clone());

        if range.metadata.deletion_timestamp.is_some() {
            return self
                .teardown(&ip_range_api, range, &name, owner, &mut status, &sink)
                .await;
        }

        self.ensure_finalizer(&ip_range_api, range, &name).await?;

        // The scope supplies the zone list and the VPC name; without it
        // nothing can be provisioned yet.
        let scope = self.load_scope(range, namespace).await?;
        let ctx = StepContext {
            client: Arc::clone(&self.vpc_client),
            zones: scope.spec.zones.clone(),
            vpc_name: scope.spec.vpc_name.clone(),
            owner,
        };

        if status.state.is_none() {
            status.state = Some(RangeState::Processing);
        }

        let outcome = run_provisioning(&ctx, &range.spec.cidr, &mut status, &sink).await?;
        match outcome {
            StepOutcome::Continue => {
                status::project_ready(&mut status);
                sink.persist(&status).await?;
                info!("IpRange {}/{} is ready", namespace, name);
                Ok(Action::requeue(DRIFT_REQUEUE))
            }
            StepOutcome::RetryAfter(delay) => {
                sink.persist(&status).await?;
                Ok(Action::requeue(delay))
            }
            StepOutcome::Terminal { reason, message } => {
                warn!(
                    "IpRange {}/{} hit terminal error {}: {}",
                    namespace, name, reason, message
                );
                status::project_error(&mut status, reason, &message);
                sink.persist(&status).await?;
                // No requeue: only a spec change can fix this, and that
                // triggers a fresh reconciliation on its own.
                Ok(Action::await_change())
            }
        }
    }

    async fn teardown(
        &self,
        api: &Api<IpRange>,
        range: &IpRange,
        name: &str,
        owner: String,
        status: &mut IpRangeStatus,
        sink: &KubeStatusSink,
    ) -> Result<Action, ControllerError> {
        if !has_finalizer(range) {
            return Ok(Action::await_change());
        }

        // Teardown must not depend on the scope still existing: the cached
        // vpcId and association id in status are enough.
        let ctx = StepContext {
            client: Arc::clone(&self.vpc_client),
            zones: Vec::new(),
            vpc_name: String::new(),
            owner,
        };

        let outcome = run_teardown(&ctx, status, sink).await?;
        match outcome {
            StepOutcome::Continue => {
                self.remove_finalizer(api, range, name).await?;
                info!("IpRange {} torn down", name);
                Ok(Action::await_change())
            }
            StepOutcome::RetryAfter(delay) => Ok(Action::requeue(delay)),
            StepOutcome::Terminal { reason, message } => {
                warn!("IpRange {} teardown error {}: {}", name, reason, message);
                status::project_error(status, reason, &message);
                sink.persist(status).await?;
                Ok(Action::await_change())
            }
        }
    }

    async fn load_scope(
        &self,
        range: &IpRange,
        namespace: &str,
    ) -> Result<CloudScope, ControllerError> {
        let scope_name = &range.spec.scope_ref.name;
        let scope_namespace = range
            .spec
            .scope_ref
            .namespace
            .as_deref()
            .unwrap_or(namespace);
        let scope_api: Api<CloudScope> = Api::namespaced(self.kube_client.clone(), scope_namespace);
        scope_api.get(scope_name).await.map_err(|e| {
            ControllerError::ScopeNotFound(format!("{scope_namespace}/{scope_name}: {e}"))
        })
    }

    async fn ensure_finalizer(
        &self,
        api: &Api<IpRange>,
        range: &IpRange,
        name: &str,
    ) -> Result<(), ControllerError> {
        if has_finalizer(range) {
            return Ok(());
        }
        let mut finalizers = range.metadata.finalizers.clone().unwrap_or_default();
        finalizers.push(IPRANGE_FINALIZER.to_string());
        let patch = json!({"metadata": {"finalizers": finalizers}});
        api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn remove_finalizer(
        &self,
        api: &Api<IpRange>,
        range: &IpRange,
        name: &str,
    ) -> Result<(), ControllerError> {
        let finalizers: Vec<String> = range
            .metadata
            .finalizers
            .clone()
            .unwrap_or_default()
            .into_iter()
            .filter(|f| f != IPRANGE_FINALIZER)
            .collect();
        let patch = json!({"metadata": {"finalizers": finalizers}});
        api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

fn has_finalizer(range: &IpRange) -> bool {
    range
        .metadata
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|x| x == IPRANGE_FINALIZER))
}
