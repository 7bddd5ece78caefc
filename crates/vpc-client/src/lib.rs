//! Cloud Network API Client
//!
//! A client for the cloud provider's virtual network API, covering the
//! operations the IpRange controller needs: VPC lookup, CIDR block
//! association and subnet lifecycle.
//!
//! # Example
//!
//! ```no_run
//! use vpc_client::{VpcClient, VpcClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = VpcClient::new(
//!     "https://network.cloud.example".to_string(),
//!     "your-api-token".to_string(),
//! )?;
//!
//! // Find a VPC by its name tag
//! let vpcs = client.list_vpcs("wl-prod-1").await?;
//!
//! // Associate an address block with it
//! if let Some(vpc) = vpcs.first() {
//!     let association_id = client.associate_cidr_block(&vpc.id, "10.250.0.0/22").await?;
//!     println!("association: {association_id}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod vpc_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::VpcClient;
pub use error::VpcError;
pub use models::*;
pub use vpc_trait::VpcClientTrait;
#[cfg(feature = "test-util")]
pub use mock::{MockCalls, MockVpcClient};
