//! Cloud network API client
//!
//! REST client for the provider's network service. Endpoint layout follows
//! the provider API: /api/network/vpcs/ and nested cidr-association and
//! subnet collections.

use crate::error::VpcError;
use crate::models::*;
use crate::vpc_trait::VpcClientTrait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Cloud network API client
#[derive(Debug)]
pub struct VpcClient {
    client: Client,
    base_url: String,
    token: String,
}

impl VpcClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Network API base URL (e.g., "https://network.cloud.example")
    /// * `token` - API token for authentication
    pub fn new(base_url: String, token: String) -> Result<Self, VpcError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(VpcError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Validate the API token by making a lightweight authenticated request.
    pub async fn validate_token(&self) -> Result<(), VpcError> {
        let url = format!("{}/api/status/", self.base_url);
        debug!("Validating network API token and connectivity");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(VpcError::Http)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(VpcError::Authentication(format!("{status} - {body}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VpcError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        debug!("Token validated successfully");
        Ok(())
    }

    async fn check(&self, response: Response, what: &str) -> Result<Response, VpcError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(VpcError::NotFound(format!("{what}: {body}"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(VpcError::Authentication(format!("{what}: {status} - {body}")))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                Err(VpcError::RateLimited(format!("{what}: {body}")))
            }
            _ => Err(VpcError::Api {
                status: status.as_u16(),
                message: format!("{what}: {body}"),
            }),
        }
    }

    async fn get_json<T: for<'de> serde::Deserialize<'de>>(
        &self,
        url: String,
        what: &str,
    ) -> Result<T, VpcError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await?;
        let response = self.check(response, what).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl VpcClientTrait for VpcClient {
    async fn list_vpcs(&self, name: &str) -> Result<Vec<Vpc>, VpcError> {
        let url = format!(
            "{}/api/network/vpcs/?name={}",
            self.base_url,
            urlencoding::encode(name)
        );
        let page: ListResponse<Vpc> = self.get_json(url, "list vpcs").await?;
        Ok(page.results)
    }

    async fn get_vpc(&self, vpc_id: &str) -> Result<Vpc, VpcError> {
        let url = format!("{}/api/network/vpcs/{}/", self.base_url, vpc_id);
        self.get_json(url, "get vpc").await
    }

    async fn associate_cidr_block(&self, vpc_id: &str, cidr: &str) -> Result<String, VpcError> {
        let url = format!(
            "{}/api/network/vpcs/{}/cidr-associations/",
            self.base_url, vpc_id
        );
        debug!("POST {} cidr={}", url, cidr);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.token))
            .json(&AssociateCidrRequest { cidr })
            .send()
            .await?;
        let response = self.check(response, "associate cidr block").await?;
        let association: CidrAssociation = response.json().await?;
        Ok(association.association_id)
    }

    async fn disassociate_cidr_block(&self, association_id: &str) -> Result<(), VpcError> {
        let url = format!(
            "{}/api/network/cidr-associations/{}/",
            self.base_url, association_id
        );
        debug!("DELETE {}", url);
        let response = self
            .client
            .delete(&url)
            .header("Authorization", format!("Token {}", self.token))
            .send()
            .await?;
        self.check(response, "disassociate cidr block").await?;
        Ok(())
    }

    async fn list_subnets(&self, vpc_id: &str) -> Result<Vec<Subnet>, VpcError> {
        let url = format!("{}/api/network/vpcs/{}/subnets/", self.base_url, vpc_id);
        let page: ListResponse<Subnet> = self.get_json(url, "list subnets").await?;
        Ok(page.results)
    }

    async fn create_subnet(
        &self,
        vpc_id: &str,
        zone: &str,
        cidr: &str,
        tags: &[Tag],
    ) -> Result<Subnet, VpcError> {
        let url = format!("{}/api/network/vpcs/{}/subnets/", self.base_url, vpc_id);
        debug!("POST {} zone={} cidr={}", url, zone, cidr);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.token))
            .json(&CreateSubnetRequest { zone, cidr, tags })
            .send()
            .await?;
        let response = self.check(response, "create subnet").await?;
        Ok(response.json().await?)
    }

    async fn delete_subnet(&self, subnet_id: &str) -> Result<(), VpcError> {
        let url = format!("{}/api/network/subnets/{}/", self.base_url, subnet_id);
        debug!("DELETE {}", url);
        let response = self
            .client
            .delete(&url)
            .header("Authorization", format!("Token {}", self.token))
            .send()
            .await?;
        self.check(response, "delete subnet").await?;
        Ok(())
    }
}
