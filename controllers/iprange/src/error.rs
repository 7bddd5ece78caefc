//! Controller-specific error types.

use kube::Error as KubeError;
use thiserror::Error;
use vpc_client::VpcError;

/// Errors that can occur in the IpRange Controller.
///
/// Errors surfaced through this type are retryable: the error policy
/// requeues the resource after a short delay. Configuration problems that
/// retrying cannot fix (overlapping CIDR, missing VPC, ...) never become a
/// `ControllerError`; they are projected onto the resource status as an
/// Error condition instead and requeuing stops.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Cloud network API error
    #[error("Cloud network API error: {0}")]
    Vpc(#[from] VpcError),

    /// Referenced CloudScope could not be loaded
    #[error("CloudScope not found: {0}")]
    ScopeNotFound(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
