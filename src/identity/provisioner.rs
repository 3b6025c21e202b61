//! Identity provisioning through the faucet.
//!
//! # Steps
//! ```text
//! CreateWallet → GenerateKey → DeriveAddress → ClaimChain
//! ```
//! Each step may fail on its own; the first failure aborts provisioning and
//! nothing is kept across calls.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::identity::keys::{owner_of, KeyStore, Signer};
use crate::transport::{ChainId, Faucet, Owner, Wallet};

/// Provisioning step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStage {
    CreateWallet,
    GenerateKey,
    DeriveAddress,
    ClaimChain,
}

impl fmt::Display for ProvisioningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            ProvisioningStage::CreateWallet => "create wallet",
            ProvisioningStage::GenerateKey => "generate key",
            ProvisioningStage::DeriveAddress => "derive address",
            ProvisioningStage::ClaimChain => "claim chain",
        };
        f.write_str(stage)
    }
}

/// Identity provisioning failed at `stage`.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("provisioning failed at {stage}: {cause}")]
pub struct ProvisioningError {
    pub stage: ProvisioningStage,
    pub cause: String,
}

impl ProvisioningError {
    fn at(stage: ProvisioningStage, cause: impl fmt::Display) -> Self {
        Self {
            stage,
            cause: cause.to_string(),
        }
    }
}

/// Identity produced by a successful provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionedIdentity {
    pub wallet: Wallet,
    pub signer: Arc<dyn Signer>,
    pub owner: Owner,
    pub chain_id: ChainId,
}

/// Creates a wallet, a signing key and a claimed chain.
#[derive(Clone)]
pub struct IdentityProvisioner {
    faucet: Arc<dyn Faucet>,
    keys: Arc<dyn KeyStore>,
}

impl IdentityProvisioner {
    pub fn new(faucet: Arc<dyn Faucet>, keys: Arc<dyn KeyStore>) -> Self {
        Self { faucet, keys }
    }

    /// Run the four provisioning steps in order.
    pub async fn provision(&self) -> Result<ProvisionedIdentity, ProvisioningError> {
        let wallet = self
            .faucet
            .create_wallet()
            .await
            .map_err(|e| ProvisioningError::at(ProvisioningStage::CreateWallet, e))?;

        let signer = self
            .keys
            .signing_key()
            .map_err(|e| ProvisioningError::at(ProvisioningStage::GenerateKey, e))?;

        let owner = owner_of(signer.as_ref())
            .map_err(|e| ProvisioningError::at(ProvisioningStage::DeriveAddress, e))?;

        let chain_id = self
            .faucet
            .claim_chain(&wallet, &owner)
            .await
            .map_err(|e| ProvisioningError::at(ProvisioningStage::ClaimChain, e))?;

        tracing::info!(owner = %owner, chain_id = %chain_id, "Identity provisioned");

        Ok(ProvisionedIdentity {
            wallet,
            signer,
            owner,
            chain_id,
        })
    }
}
