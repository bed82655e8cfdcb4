//! GraphQL-over-HTTP transport for the registration backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{ReferenceData, RegistrationResult},
    protocol::{GraphQlRequest, GraphQlResponse, RegisterUserData},
    registration::RegistrationVariables,
};
use tracing::{debug, warn};
use url::Url;

use crate::{error::ClientError, RegistrationBackend};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8443/graphql";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: Url,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        let endpoint = Url::parse(endpoint).map_err(|source| ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        Ok(Self {
            endpoint,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct GraphQlClient {
    http: Client,
    endpoint: Url,
}

impl GraphQlClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Posts one operation and unwraps its `data`. Any `errors` entry fails the call.
    pub async fn execute<V, T>(
        &self,
        request: &GraphQlRequest<V>,
        operation: &'static str,
    ) -> Result<T, ClientError>
    where
        V: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!(endpoint = %self.endpoint, operation, "sending graphql request");
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            warn!(operation, status = status.as_u16(), "graphql request rejected");
            return Err(
                match serde_json::from_slice::<GraphQlResponse<serde_json::Value>>(&body)
                    .ok()
                    .and_then(|envelope| envelope.error_summary())
                {
                    Some(summary) => ClientError::GraphQl(summary),
                    None => ClientError::Status {
                        status: status.as_u16(),
                    },
                },
            );
        }

        let envelope: GraphQlResponse<T> = serde_json::from_slice(&body)?;
        if let Some(summary) = envelope.error_summary() {
            warn!(operation, errors = %summary, "graphql response carried errors");
            return Err(ClientError::GraphQl(summary));
        }
        envelope.data.ok_or(ClientError::MissingData(operation))
    }
}

#[async_trait]
impl RegistrationBackend for GraphQlClient {
    async fn fetch_reference_data(&self) -> Result<ReferenceData, ClientError> {
        self.execute(&GraphQlRequest::initial_data(), "InitialData")
            .await
    }

    async fn register_user(
        &self,
        variables: &RegistrationVariables,
    ) -> Result<RegistrationResult, ClientError> {
        let data: RegisterUserData = self
            .execute(&GraphQlRequest::register_user(variables), "RegisterUser")
            .await?;
        Ok(data.register_user)
    }
}
