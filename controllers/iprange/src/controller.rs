//! Controller wiring.
//!
//! Connects the reconciler to the Kubernetes watch machinery and to the
//! cloud network API.

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crds::IpRange;
use futures::StreamExt;
use kube::{Api, Client};
use kube_runtime::controller::{Action, Controller as RuntimeController};
use kube_runtime::watcher;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use vpc_client::VpcClient;

const ERROR_REQUEUE: Duration = Duration::from_secs(30);

/// IpRange controller.
pub struct Controller {
    ip_range_api: Api<IpRange>,
    reconciler: Arc<Reconciler>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(
        cloud_api_url: String,
        cloud_api_token: String,
        namespace: Option<String>,
    ) -> Result<Self, ControllerError> {
        info!("Initializing IpRange Controller");

        let kube_client = Client::try_default().await?;

        let vpc_client = VpcClient::new(cloud_api_url, cloud_api_token)?;
        if let Err(e) = vpc_client.validate_token().await {
            error!("Network API token validation failed: {}", e);
            error!("Check CLOUD_API_URL and CLOUD_API_TOKEN");
            return Err(e.into());
        }
        info!("Network API connectivity verified");

        let ns = namespace.as_deref().unwrap_or("default");
        let ip_range_api: Api<IpRange> = Api::namespaced(kube_client.clone(), ns);

        let reconciler = Arc::new(Reconciler::new(kube_client, Arc::new(vpc_client)));

        Ok(Self {
            ip_range_api,
            reconciler,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("IpRange Controller running");

        RuntimeController::new(self.ip_range_api, watcher::Config::default())
            .shutdown_on_signal()
            .run(reconcile, error_policy, self.reconciler)
            .for_each(|result| async move {
                match result {
                    Ok((obj, _action)) => debug!("Reconciled {}", obj.name),
                    Err(e) => debug!("Reconciliation failed: {:?}", e),
                }
            })
            .await;

        info!("IpRange Controller stopped");
        Ok(())
    }
}

async fn reconcile(range: Arc<IpRange>, ctx: Arc<Reconciler>) -> Result<Action, ControllerError> {
    ctx.reconcile(&range).await
}

fn error_policy(range: Arc<IpRange>, error: &ControllerError, _ctx: Arc<Reconciler>) -> Action {
    warn!(
        "Reconciliation error for {}: {}",
        range.metadata.name.as_deref().unwrap_or("unknown"),
        error
    );
    Action::requeue(ERROR_REQUEUE)
}
