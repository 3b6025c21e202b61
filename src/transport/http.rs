//! HTTP implementations of the transport seams.
//!
//! # Endpoints
//! ```text
//! POST {faucet}                                        faucet GraphQL (wallet, chain claim)
//! POST {node}/chains/{chain}/applications/{app}        application queries and mutations
//! WS   {node}/ws                                       notification subscription
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::codec::{self, Operation};
use crate::config::schema::{EnvironmentConfig, FaucetConfig, NodeConfig};
use crate::identity::{KeyStore, Signer};
use crate::transport::notifications;
use crate::transport::{
    Application, ApplicationId, ChainClient, ChainConnector, ChainId, EnvironmentSession, Faucet,
    HostEnvironment, NotificationStream, Owner, TransportError, Wallet,
};

fn parse_endpoint(raw: &str) -> Result<Url, TransportError> {
    Url::parse(raw).map_err(|e| TransportError::InvalidEndpoint(format!("{}: {}", raw, e)))
}

fn build_http(timeout_secs: u64, connect_timeout_secs: u64) -> Result<reqwest::Client, TransportError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .build()
        .map_err(TransportError::from)
}

/// POST a wire payload and return the response body.
async fn post(http: &reqwest::Client, url: &Url, payload: String) -> Result<String, TransportError> {
    let response = http
        .post(url.clone())
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(payload)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    classify_reply(status.as_u16(), body)
}

/// Non-success replies that still carry a GraphQL error list are handed to
/// the codec, so they surface as application errors instead of transport ones.
fn classify_reply(status: u16, body: String) -> Result<String, TransportError> {
    if (200..300).contains(&status) {
        return Ok(body);
    }
    match codec::decode(&body) {
        Ok(response) if !response.errors.is_empty() => {
            tracing::debug!(status, "Error status with an application error list");
            Ok(body)
        }
        _ => Err(TransportError::Status { status, body }),
    }
}

/// Run an operation against a GraphQL endpoint and return one data field.
async fn call_field(
    http: &reqwest::Client,
    url: &Url,
    operation: &Operation,
) -> Result<Value, TransportError> {
    let request = codec::encode(operation).map_err(|e| TransportError::Malformed(e.to_string()))?;
    let raw = post(http, url, request.to_wire()).await?;
    let response = codec::decode(&raw).map_err(|e| TransportError::Malformed(e.to_string()))?;
    if !response.errors.is_empty() {
        return Err(TransportError::Rejected(response.errors.join("; ")));
    }
    Ok(response
        .data
        .and_then(|mut data| data.remove(operation.name()))
        .unwrap_or(Value::Null))
}

/// Faucet reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFaucet {
    http: reqwest::Client,
    url: Url,
}

impl HttpFaucet {
    pub fn new(config: &FaucetConfig) -> Result<Self, TransportError> {
        Ok(Self {
            http: build_http(config.timeout_secs, config.timeout_secs)?,
            url: parse_endpoint(&config.url)?,
        })
    }
}

#[async_trait]
impl Faucet for HttpFaucet {
    async fn create_wallet(&self) -> Result<Wallet, TransportError> {
        let genesis_config = call_field(&self.http, &self.url, &Operation::query("genesisConfig")).await?;
        if genesis_config.is_null() {
            return Err(TransportError::Malformed("faucet returned no genesis config".into()));
        }
        Ok(Wallet { genesis_config })
    }

    async fn claim_chain(&self, _wallet: &Wallet, owner: &Owner) -> Result<ChainId, TransportError> {
        let operation = Operation::mutation("claim").arg("owner", owner.as_str());
        let claimed = call_field(&self.http, &self.url, &operation).await?;
        chain_id_from_claim(&claimed)
    }
}

/// A claim answers with a chain id string or a chain description object.
fn chain_id_from_claim(claimed: &Value) -> Result<ChainId, TransportError> {
    let id = match claimed {
        Value::String(id) => Some(id.as_str()),
        Value::Object(map) => map
            .get("id")
            .or_else(|| map.get("chainId"))
            .and_then(Value::as_str),
        _ => None,
    };
    id.map(ChainId::from)
        .ok_or_else(|| TransportError::Malformed(format!("unexpected claim reply: {}", claimed)))
}

/// Application handle addressed over HTTP.
#[derive(Debug, Clone)]
pub struct HttpApplication {
    http: reqwest::Client,
    url: Url,
}

#[async_trait]
impl crate::transport::Application for HttpApplication {
    async fn query(&self, request: &str) -> Result<String, TransportError> {
        post(&self.http, &self.url, request.to_string()).await
    }
}

/// Chain client talking to a node service.
#[derive(Debug, Clone)]
pub struct HttpChainClient {
    http: reqwest::Client,
    base: Url,
    chain_id: ChainId,
}

impl HttpChainClient {
    pub fn new(config: &NodeConfig, chain_id: ChainId) -> Result<Self, TransportError> {
        Ok(Self {
            http: build_http(config.request_timeout_secs, config.connect_timeout_secs)?,
            base: parse_endpoint(&config.service_url)?,
            chain_id,
        })
    }

    fn with_segments(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidEndpoint(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of an application on this client's chain.
    pub fn application_url(&self, application_id: &ApplicationId) -> Result<Url, TransportError> {
        self.with_segments(&[
            "chains",
            self.chain_id.as_str(),
            "applications",
            application_id.as_str(),
        ])
    }

    /// WebSocket URL for notification subscriptions.
    pub fn notifications_url(&self) -> Result<Url, TransportError> {
        let mut url = self.with_segments(&["ws"])?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| TransportError::InvalidEndpoint(url.to_string()))?;
        Ok(url)
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Arc<dyn Application>, TransportError> {
        let application = HttpApplication {
            http: self.http.clone(),
            url: self.application_url(application_id)?,
        };

        // Probe so that an unknown application fails here rather than on first use.
        match call_field(&application.http, &application.url, &Operation::query("__typename")).await {
            Ok(_) => {}
            Err(TransportError::Status { status: 404, .. }) | Err(TransportError::Rejected(_)) => {
                return Err(TransportError::NotFound(format!(
                    "application {} on chain {}",
                    application_id, self.chain_id
                )));
            }
            Err(e) => return Err(e),
        }

        tracing::info!(
            application_id = %application_id,
            chain_id = %self.chain_id,
            "Connected to application"
        );
        Ok(Arc::new(application))
    }

    async fn notifications(&self) -> Result<NotificationStream, TransportError> {
        notifications::subscribe(self.notifications_url()?, self.chain_id.clone()).await
    }
}

/// Builds HTTP chain clients for self-provisioned chains.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    node: NodeConfig,
}

impl HttpConnector {
    pub fn new(node: NodeConfig) -> Self {
        Self { node }
    }
}

#[async_trait]
impl ChainConnector for HttpConnector {
    async fn connect(
        &self,
        _wallet: &Wallet,
        signer: Arc<dyn Signer>,
        chain_id: &ChainId,
    ) -> Result<Arc<dyn ChainClient>, TransportError> {
        tracing::debug!(owner = %signer.address(), chain_id = %chain_id, "Building node client");
        Ok(Arc::new(HttpChainClient::new(&self.node, chain_id.clone())?))
    }
}

/// Session already running in a node service configured by the host.
pub struct NodeServiceEnvironment {
    environment: EnvironmentConfig,
    node: NodeConfig,
    keys: Arc<dyn KeyStore>,
}

impl NodeServiceEnvironment {
    pub fn new(environment: EnvironmentConfig, node: NodeConfig, keys: Arc<dyn KeyStore>) -> Self {
        Self {
            environment,
            node,
            keys,
        }
    }
}

#[async_trait]
impl HostEnvironment for NodeServiceEnvironment {
    async fn session(&self) -> Result<Option<EnvironmentSession>, TransportError> {
        let chain_id = match (&self.environment.enabled, &self.environment.chain_id) {
            (true, Some(chain_id)) => ChainId::from(chain_id.as_str()),
            _ => return Ok(None),
        };

        let signer = self
            .keys
            .signing_key()
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        let owner_raw = self
            .environment
            .owner
            .clone()
            .unwrap_or_else(|| signer.address());
        let owner = Owner::parse(&owner_raw).map_err(TransportError::Unavailable)?;

        let client = HttpChainClient::new(&self.node, chain_id.clone())?;
        Ok(Some(EnvironmentSession {
            client: Arc::new(client),
            chain_id,
            owner,
            signer,
        }))
    }
}
