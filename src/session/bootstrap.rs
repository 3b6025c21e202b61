//! Connection bootstrap state machine.
//!
//! # States
//! - Init: nothing attempted yet
//! - TryEnvironment: adopt a session injected by the host
//! - TrySelfProvision: provision an identity through the faucet
//! - Connected: terminal success, session installed
//! - Failed: terminal failure, cause returned to every waiting caller
//!
//! # State Transitions
//! ```text
//! Init → TryEnvironment
//! TryEnvironment → Connected          host session + application handle resolved
//! TryEnvironment → TrySelfProvision   anything missing or failing
//! TrySelfProvision → Connected        identity, client and (optional) application ready
//! TrySelfProvision → Failed           any step failing
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;

use crate::identity::{IdentityProvisioner, ProvisioningError};
use crate::observability::metrics;
use crate::session::state::{ConnectedVia, Session, SessionSlot};
use crate::transport::{ApplicationId, ChainConnector, HostEnvironment, TransportError};

/// Bootstrap failure, shared by every caller that awaited the attempt.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BootstrapError {
    /// Identity provisioning failed.
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    /// Client for the claimed chain could not be built.
    #[error("failed to build chain client: {0}")]
    Client(TransportError),

    /// Configured application could not be resolved.
    #[error("failed to resolve application {application}: {cause}")]
    Application {
        application: String,
        cause: TransportError,
    },
}

/// Bootstrap state, exposed for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    Init,
    TryEnvironment,
    TrySelfProvision,
    Connected,
    Failed,
}

impl fmt::Display for BootstrapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

enum Step {
    Init,
    TryEnvironment,
    TrySelfProvision,
    Connected(Arc<Session>),
    Failed(BootstrapError),
}

impl Step {
    fn phase(&self) -> BootstrapPhase {
        match self {
            Step::Init => BootstrapPhase::Init,
            Step::TryEnvironment => BootstrapPhase::TryEnvironment,
            Step::TrySelfProvision => BootstrapPhase::TrySelfProvision,
            Step::Connected(_) => BootstrapPhase::Connected,
            Step::Failed(_) => BootstrapPhase::Failed,
        }
    }
}

type Outcome = Result<Arc<Session>, BootstrapError>;
type SharedOutcome = Shared<BoxFuture<'static, Outcome>>;

struct Inner {
    environment: Arc<dyn HostEnvironment>,
    provisioner: IdentityProvisioner,
    connector: Arc<dyn ChainConnector>,
    application_id: Option<ApplicationId>,
    slot: SessionSlot,
}

/// Runs the bootstrap state machine, at most once at a time.
pub struct Bootstrap {
    inner: Arc<Inner>,
    inflight: Mutex<Option<SharedOutcome>>,
}

impl Bootstrap {
    pub fn new(
        environment: Arc<dyn HostEnvironment>,
        provisioner: IdentityProvisioner,
        connector: Arc<dyn ChainConnector>,
        application_id: Option<ApplicationId>,
        slot: SessionSlot,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                environment,
                provisioner,
                connector,
                application_id,
                slot,
            }),
            inflight: Mutex::new(None),
        }
    }

    /// Connect, or join the attempt already in flight.
    ///
    /// A live session from an earlier attempt is returned as is. A failed or
    /// torn-down earlier attempt is replaced by a new one.
    pub async fn connect(&self) -> Result<Arc<Session>, BootstrapError> {
        let attempt = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            let reusable = match inflight.as_ref().map(|attempt| attempt.peek()) {
                Some(None) => true,
                Some(Some(Ok(session))) => self
                    .inner
                    .slot
                    .current()
                    .is_some_and(|live| Arc::ptr_eq(&live, session)),
                Some(Some(Err(_))) | None => false,
            };
            let attempt = match inflight.take() {
                Some(attempt) if reusable => attempt,
                _ => {
                    let inner = self.inner.clone();
                    async move { inner.run().await }.boxed().shared()
                }
            };
            *inflight = Some(attempt.clone());
            attempt
        };
        attempt.await
    }
}

impl Inner {
    async fn run(&self) -> Outcome {
        let mut step = Step::Init;
        loop {
            tracing::debug!(phase = %step.phase(), "Bootstrap step");
            step = match step {
                Step::Init => Step::TryEnvironment,
                Step::TryEnvironment => match self.try_environment().await {
                    Ok(session) => Step::Connected(session),
                    Err(reason) => {
                        tracing::info!(reason = %reason, "Host session unavailable, self-provisioning");
                        Step::TrySelfProvision
                    }
                },
                Step::TrySelfProvision => match self.try_self_provision().await {
                    Ok(session) => Step::Connected(session),
                    Err(e) => Step::Failed(e),
                },
                Step::Connected(session) => {
                    self.slot.install(session.clone());
                    metrics::record_bootstrap("connected", session.via().as_str());
                    tracing::info!(
                        chain_id = %session.id(),
                        owner = %session.owner(),
                        via = session.via().as_str(),
                        has_application = session.application().is_some(),
                        "Connected"
                    );
                    return Ok(session);
                }
                Step::Failed(e) => {
                    metrics::record_bootstrap("failed", "none");
                    tracing::error!(error = %e, "Bootstrap failed");
                    return Err(e);
                }
            };
        }
    }

    /// Adopt the host session; any gap is reported as a reason string.
    async fn try_environment(&self) -> Result<Arc<Session>, String> {
        let host = self
            .environment
            .session()
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "no host session".to_string())?;
        let application_id = self
            .application_id
            .as_ref()
            .ok_or_else(|| "no application id configured".to_string())?;
        let application = host
            .client
            .application(application_id)
            .await
            .map_err(|e| format!("application {}: {}", application_id, e))?;

        Ok(Arc::new(Session::new(
            host.chain_id,
            host.owner,
            host.signer,
            host.client,
            Some(application),
            ConnectedVia::Environment,
        )))
    }

    async fn try_self_provision(&self) -> Result<Arc<Session>, BootstrapError> {
        let identity = self.provisioner.provision().await?;
        let client = self
            .connector
            .connect(&identity.wallet, identity.signer.clone(), &identity.chain_id)
            .await
            .map_err(BootstrapError::Client)?;

        let application = match &self.application_id {
            Some(id) => Some(client.application(id).await.map_err(|cause| {
                BootstrapError::Application {
                    application: id.to_string(),
                    cause,
                }
            })?),
            None => {
                tracing::warn!("No application id configured; domain operations are unavailable");
                None
            }
        };

        Ok(Arc::new(Session::new(
            identity.chain_id,
            identity.owner,
            identity.signer,
            client,
            application,
            ConnectedVia::SelfProvisioned,
        )))
    }
}
