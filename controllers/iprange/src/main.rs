//! IpRange Controller
//!
//! Provisions isolated IPv4 address space inside a cloud VPC on behalf of
//! `IpRange` resources: associates the requested CIDR block with the VPC
//! named by the referenced `CloudScope`, splits it into one range per
//! availability zone, and manages the matching subnets.

mod controller;
mod error;
mod reconciler;

use crate::error::ControllerError;
use controller::Controller;
use std::env;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt::init();

    info!("Starting IpRange Controller");

    // Load configuration from environment variables
    let cloud_api_url = env::var("CLOUD_API_URL")
        .unwrap_or_else(|_| "http://network-api.cloud:80".to_string());
    let cloud_api_token = env::var("CLOUD_API_TOKEN").map_err(|_| {
        ControllerError::InvalidConfig("CLOUD_API_TOKEN environment variable is required".to_string())
    })?;
    let namespace = env::var("WATCH_NAMESPACE").ok();

    info!("Configuration:");
    info!("  Cloud API URL: {}", cloud_api_url);
    info!("  Namespace: {}", namespace.as_deref().unwrap_or("default"));

    // Initialize and run controller
    let controller = Controller::new(cloud_api_url, cloud_api_token, namespace).await?;
    controller.run().await?;

    Ok(())
}
